/*!

Per-replica infection state. Each replica owns one `Infections` value for its
whole run; nothing here is shared or locked, and the buffers are reused
across replicas through [`Infections::reset`] rather than reallocated
thousands of times.

*/

/// Infection counts per disease class per node, kept separately for the work
/// and play movement layers.
///
/// Both buffers are `disease_classes x nnodes`: `work[class][node]` is the
/// number of workers of `node` currently in `class`, and likewise for
/// `play`. The value is deliberately not `Clone`; a replica gets exclusive
/// use of its buffers by owning them.
#[derive(Debug)]
pub struct Infections {
    pub work: Vec<Vec<u32>>,
    pub play: Vec<Vec<u32>>,
}

impl Infections {
    /// Allocates zeroed buffers for `disease_classes` classes over `nnodes`
    /// nodes.
    pub fn allocate(disease_classes: usize, nnodes: usize) -> Infections {
        Infections {
            work: vec![vec![0; nnodes]; disease_classes],
            play: vec![vec![0; nnodes]; disease_classes],
        }
    }

    /// Zeroes every count in place, keeping the allocations, so the same
    /// value can serve the next replica.
    pub fn reset(&mut self) {
        for row in self.work.iter_mut().chain(&mut self.play) {
            row.fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sizes_both_layers() {
        let infections = Infections::allocate(3, 7);

        assert_eq!(infections.work.len(), 3);
        assert_eq!(infections.play.len(), 3);
        assert!(infections.work.iter().all(|row| row.len() == 7));
        assert!(infections.play.iter().all(|row| row.len() == 7));
        assert!(
            infections
                .work
                .iter()
                .chain(&infections.play)
                .all(|row| row.iter().all(|&count| count == 0))
        );
    }

    #[test]
    fn reset_zeroes_without_reallocating() {
        let mut infections = Infections::allocate(2, 4);
        infections.work[1][2] = 9;
        infections.play[0][3] = 4;
        let work_ptr = infections.work[1].as_ptr();

        infections.reset();

        assert_eq!(infections.work.len(), 2);
        assert_eq!(infections.work[1].len(), 4);
        assert_eq!(infections.work[1][2], 0);
        assert_eq!(infections.play[0][3], 0);
        assert_eq!(infections.work[1].as_ptr(), work_ptr);
    }

    #[test]
    fn zero_classes_is_a_valid_degenerate_shape() {
        let mut infections = Infections::allocate(0, 5);
        assert!(infections.work.is_empty());
        infections.reset();
        assert!(infections.play.is_empty());
    }
}
