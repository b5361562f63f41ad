/// A 2-D position. The Euclidean metric treats `x`/`y` as planar
/// coordinates; the great-circle metric reads them as longitude and latitude
/// in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One ward in the contact network.
///
/// A node's index in `Network::nodes` is its canonical identifier; `label`
/// always equals that index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub label: usize,

    /// Total outgoing population mass, work plus play. Conserved by every
    /// rebalancing operation.
    pub population: f64,

    /// Where this ward sits, if a position record was supplied for it.
    pub position: Option<Position>,

    /// Sum of this node's outgoing work-link weights.
    pub work_weight: f64,

    /// Sum of this node's outgoing play-link weights.
    pub play_weight: f64,
}

impl Node {
    /// A node with the given label and no position, weights, or population.
    /// [`Network::from_tables`](crate::Network::from_tables) derives the
    /// weights and population from the link tables.
    pub fn new(label: usize) -> Node {
        Node {
            label,
            population: 0.0,
            position: None,
            work_weight: 0.0,
            play_weight: 0.0,
        }
    }
}
