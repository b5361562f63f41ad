/// A directed edge between two wards.
///
/// Which layer a link belongs to (work, play, weekend) is determined by the
/// table it lives in on the `Network`, not by a field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
    /// Source node index.
    pub from: usize,
    /// Destination node index.
    pub to: usize,
    /// Contact intensity carried by this edge.
    pub weight: f64,
    /// Distance between the endpoint positions; `None` until the distance
    /// calculator has run.
    pub distance: Option<f64>,
}

impl Link {
    /// An unannotated link; `distance` stays `None` until the distance
    /// calculator runs.
    pub fn new(from: usize, to: usize, weight: f64) -> Link {
        Link {
            from,
            to,
            weight,
            distance: None,
        }
    }
}
