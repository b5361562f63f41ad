/*!

Population redistribution between the contact layers. Both operations run
between simulation phases, never during one, and both preserve each node's
total population: `work_weight + play_weight` is the same before and after
every call.

*/

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::WardsimError;
use crate::network::Network;
use crate::network::link::Link;

impl Network {
    /// Rescales each node's outgoing play weights so they sum to that node's
    /// `play_weight` aggregate, preserving their relative proportions.
    ///
    /// Nodes whose outgoing play weights sum to zero are left alone. A second
    /// call is a no-op.
    pub fn rescale_play_matrix(&mut self) {
        let mut sums = vec![0.0_f64; self.nnodes];
        for link in &self.play {
            sums[link.from] += link.weight;
        }

        let nodes = &self.nodes;
        for link in &mut self.play {
            let sum = sums[link.from];
            if sum > 0.0 {
                link.weight *= nodes[link.from].play_weight / sum;
            }
        }
    }

    /// Moves `fraction` of every play link's weight onto the work link with
    /// the same `(from, to)` adjacency, creating that work link when no twin
    /// exists yet. A created twin starts at zero weight and carries the play
    /// link's distance annotation, so an annotated network stays fully
    /// annotated.
    ///
    /// `fraction` must lie in `[0, 1]`; anything else (NaN included) is
    /// `InvalidParameter` and leaves the network untouched. The call also
    /// fails with `CapacityExceeded`, before mutating anything, if the work
    /// links it would have to create would push `nlinks` past `max_links`.
    pub fn move_population_from_play_to_work(
        &mut self,
        fraction: f64,
    ) -> Result<(), WardsimError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(WardsimError::InvalidParameter(format!(
                "move fraction {fraction} must lie in [0, 1]"
            )));
        }
        if fraction == 0.0 {
            return Ok(());
        }

        let mut work_index: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for (index, link) in self.to_links.iter().enumerate() {
            work_index.entry((link.from, link.to)).or_insert(index);
        }

        // Count the twins this call would create before touching anything,
        // so the ceiling invariant holds at every observable moment.
        let mut missing: FxHashSet<(usize, usize)> = FxHashSet::default();
        for link in &self.play {
            if link.weight == 0.0 {
                continue;
            }
            let key = (link.from, link.to);
            if !work_index.contains_key(&key) {
                missing.insert(key);
            }
        }
        if self.nlinks + missing.len() > self.max_links {
            return Err(WardsimError::CapacityExceeded(format!(
                "moving play population needs {} new work links, but {} of {} are already in use",
                missing.len(),
                self.nlinks,
                self.max_links
            )));
        }

        let mut moved_total = 0.0;
        for play_index in 0..self.play.len() {
            let (from, to, weight, distance) = {
                let link = &self.play[play_index];
                (link.from, link.to, link.weight, link.distance)
            };
            let moved = fraction * weight;
            if moved == 0.0 {
                continue;
            }

            self.play[play_index].weight -= moved;
            let twin = *work_index.entry((from, to)).or_insert_with(|| {
                self.to_links.push(Link {
                    from,
                    to,
                    weight: 0.0,
                    distance,
                });
                self.to_links.len() - 1
            });
            self.to_links[twin].weight += moved;

            let node = &mut self.nodes[from];
            node.play_weight -= moved;
            node.work_weight += moved;
            moved_total += moved;
        }
        self.nlinks = self.to_links.len();

        debug!(
            "moved {moved_total} population from play to work ({} work links created)",
            missing.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{InputFiles, Parameters};
    use std::path::{Path, PathBuf};

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Work links 0 -> 1 and 1 -> 2; play links 0 -> 1 (with a work twin)
    /// and 2 -> 0 (without one).
    fn mixed_network(dir: &Path, max_links: usize) -> Network {
        let params = Parameters {
            input_files: InputFiles {
                nodes: write_file(dir, "nodes.csv", "0\n1\n2\n"),
                work: write_file(dir, "work.csv", "0,1,5.0\n1,2,3.0\n"),
                play: Some(write_file(dir, "play.csv", "0,1,2.0\n2,0,4.0\n")),
                ..Default::default()
            },
            max_links,
            ..Default::default()
        };
        Network::build(params).unwrap()
    }

    fn play_sums(network: &Network) -> Vec<f64> {
        let mut sums = vec![0.0; network.nnodes];
        for link in &network.play {
            sums[link.from] += link.weight;
        }
        sums
    }

    fn assert_population_conserved(network: &Network) {
        for node in &network.nodes {
            let total = node.work_weight + node.play_weight;
            assert!(
                (total - node.population).abs() <= 1e-9 * node.population.max(1.0),
                "node {}: {} + {} != {}",
                node.label,
                node.work_weight,
                node.play_weight,
                node.population
            );
        }
    }

    #[test]
    fn rescale_restores_per_node_play_sums() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);

        // drift the raw weights away from the aggregates
        network.play[0].weight = 0.5;
        network.play[1].weight = 1.0;

        network.rescale_play_matrix();
        let sums = play_sums(&network);
        for node in &network.nodes {
            assert!(
                (sums[node.label] - node.play_weight).abs()
                    <= 1e-9 * node.play_weight.max(1.0)
            );
        }
    }

    #[test]
    fn rescale_preserves_proportions_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let params = Parameters {
            input_files: InputFiles {
                nodes: write_file(dir.path(), "nodes.csv", "0\n1\n2\n"),
                work: write_file(dir.path(), "work.csv", "0,1,1.0\n"),
                play: Some(write_file(dir.path(), "play.csv", "0,1,3.0\n0,2,1.0\n")),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut network = Network::build(params).unwrap();

        network.play[0].weight = 1.0;
        network.play[1].weight = 1.0;
        network.rescale_play_matrix();

        // play_weight is 4.0, split evenly
        assert!((network.play[0].weight - 2.0).abs() < 1e-12);
        assert!((network.play[1].weight - 2.0).abs() < 1e-12);

        let once: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        network.rescale_play_matrix();
        let twice: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn rescale_skips_zero_sum_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);
        network.play[0].weight = 0.0;
        network.play[1].weight = 0.0;

        network.rescale_play_matrix();
        assert_eq!(network.play[0].weight, 0.0);
        assert_eq!(network.play[1].weight, 0.0);
    }

    #[test]
    fn half_move_transfers_and_conserves() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);

        network.move_population_from_play_to_work(0.5).unwrap();

        // play 0 -> 1 had weight 2.0 and a work twin with 5.0
        assert!((network.play[0].weight - 1.0).abs() < 1e-12);
        assert!((network.to_links[0].weight - 6.0).abs() < 1e-12);
        // play 2 -> 0 had weight 4.0 and no twin
        assert!((network.play[1].weight - 2.0).abs() < 1e-12);
        let created = &network.to_links[2];
        assert_eq!((created.from, created.to), (2, 0));
        assert!((created.weight - 2.0).abs() < 1e-12);
        assert_eq!(network.nlinks, 3);

        assert_population_conserved(&network);
    }

    #[test]
    fn full_move_empties_the_play_layer() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);

        network.move_population_from_play_to_work(1.0).unwrap();
        assert!(network.play.iter().all(|link| link.weight == 0.0));
        assert!(network.nodes.iter().all(|node| node.play_weight == 0.0));
        assert_population_conserved(&network);
    }

    #[test]
    fn zero_move_is_exactly_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);
        let before: Vec<f64> = network.play.iter().map(|l| l.weight).collect();

        network.move_population_from_play_to_work(0.0).unwrap();
        let after: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        assert_eq!(before, after);
        assert_eq!(network.nlinks, 2);
    }

    #[test]
    fn out_of_range_fractions_are_rejected_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);
        let before: Vec<f64> = network.play.iter().map(|l| l.weight).collect();

        for fraction in [-0.1, 1.5, f64::NAN] {
            let error = network
                .move_population_from_play_to_work(fraction)
                .unwrap_err();
            assert!(matches!(error, WardsimError::InvalidParameter(_)));
        }
        let after: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn ceiling_check_happens_before_any_mutation() {
        let dir = tempfile::tempdir().unwrap();
        // two work links already at the ceiling; the 2 -> 0 play link
        // would need a third
        let mut network = mixed_network(dir.path(), 2);
        let play_before: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        let work_before: Vec<f64> = network.to_links.iter().map(|l| l.weight).collect();

        let error = network
            .move_population_from_play_to_work(0.5)
            .unwrap_err();
        assert!(matches!(error, WardsimError::CapacityExceeded(_)));

        let play_after: Vec<f64> = network.play.iter().map(|l| l.weight).collect();
        let work_after: Vec<f64> = network.to_links.iter().map(|l| l.weight).collect();
        assert_eq!(play_before, play_after);
        assert_eq!(work_before, work_after);
        assert_eq!(network.nlinks, 2);
    }

    #[test]
    fn duplicate_play_adjacencies_share_one_created_twin() {
        let dir = tempfile::tempdir().unwrap();
        let params = Parameters {
            input_files: InputFiles {
                nodes: write_file(dir.path(), "nodes.csv", "0\n1\n"),
                work: write_file(dir.path(), "work.csv", ""),
                play: Some(write_file(dir.path(), "play.csv", "0,1,2.0\n0,1,4.0\n")),
                ..Default::default()
            },
            max_links: 1,
            ..Default::default()
        };
        let mut network = Network::build(params).unwrap();

        network.move_population_from_play_to_work(0.5).unwrap();
        assert_eq!(network.nlinks, 1);
        assert!((network.to_links[0].weight - 3.0).abs() < 1e-12);
        assert_population_conserved(&network);
    }

    #[test]
    fn created_twin_inherits_the_play_distance() {
        let dir = tempfile::tempdir().unwrap();
        let params = Parameters {
            input_files: InputFiles {
                nodes: write_file(
                    dir.path(),
                    "nodes.csv",
                    "0,0.0,0.0\n1,3.0,0.0\n2,3.0,4.0\n",
                ),
                work: write_file(dir.path(), "work.csv", "0,1,5.0\n"),
                play: Some(write_file(dir.path(), "play.csv", "2,0,4.0\n")),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut network = Network::build(params).unwrap();
        assert!((network.play[0].distance.unwrap() - 5.0).abs() < 1e-12);

        network.move_population_from_play_to_work(0.25).unwrap();

        let created = &network.to_links[1];
        assert_eq!((created.from, created.to), (2, 0));
        assert!((created.weight - 1.0).abs() < 1e-12);
        assert!((created.distance.unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_moves_keep_converging() {
        let dir = tempfile::tempdir().unwrap();
        let mut network = mixed_network(dir.path(), 100);

        network.move_population_from_play_to_work(0.5).unwrap();
        network.move_population_from_play_to_work(0.5).unwrap();

        // 2.0 * 0.5 * 0.5 and 4.0 * 0.5 * 0.5
        assert!((network.play[0].weight - 0.5).abs() < 1e-12);
        assert!((network.play[1].weight - 1.0).abs() < 1e-12);
        assert_population_conserved(&network);
        assert_eq!(network.nlinks, 3);
    }
}
