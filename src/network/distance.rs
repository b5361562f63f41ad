/*!

Distance annotation. Every link in every layer gets the metric distance
between its endpoints, and the network caches the (min, max) over all of them
so the dynamic-distance cutoff can be derived once instead of rescanned each
replica. The annotation pass is all-or-nothing: position records are staged
and endpoint positions validated before anything lands on the network, so a
bad record or a missing position leaves nodes and links exactly as they were.

*/

use std::path::Path;

use log::info;

use crate::error::WardsimError;
use crate::network::Network;
use crate::network::builder::{parse_coordinate, parse_node_id, record_line, record_reader};
use crate::network::link::Link;
use crate::network::node::Position;

/// A symmetric distance between two ward positions.
pub trait DistanceMetric {
    fn compute_distance(&self, a: Position, b: Position) -> f64;
}

/// Straight-line distance in the coordinate units of the input files. The
/// default metric.
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    fn compute_distance(&self, a: Position, b: Position) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }
}

/// Great-circle distance in kilometres, treating `x` as longitude and `y` as
/// latitude in degrees (haversine, mean Earth radius).
pub struct GreatCircle;

impl DistanceMetric for GreatCircle {
    fn compute_distance(&self, a: Position, b: Position) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat_a = a.y.to_radians();
        let lat_b = b.y.to_radians();
        let half_dlat = (lat_b - lat_a) / 2.0;
        let half_dlon = (b.x - a.x).to_radians() / 2.0;

        let h = half_dlat.sin().powi(2)
            + lat_a.cos() * lat_b.cos() * half_dlon.sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }
}

impl Network {
    /// Annotates every link in every layer with the [`Euclidean`] distance
    /// between its endpoints, then derives the dynamic-distance cutoff.
    pub fn add_distances(&mut self) -> Result<(), WardsimError> {
        self.add_distances_with(&Euclidean)
    }

    /// Annotates link distances with an injected metric.
    ///
    /// Positions come from `params.input_files.position` when configured,
    /// otherwise from positions already carried by the nodes. On success the
    /// (min, max) distance pair is cached and `params.dyn_dist_cutoff` is set
    /// to `max + 1.0`, so the farthest observed link always passes a
    /// `distance < cutoff` test. On failure nothing is modified: file
    /// positions are staged and only committed together with the distances.
    pub fn add_distances_with(
        &mut self,
        metric: &dyn DistanceMetric,
    ) -> Result<(), WardsimError> {
        let mut positions: Vec<Option<Position>> =
            self.nodes.iter().map(|node| node.position).collect();
        if let Some(path) = self.params.input_files.position.clone() {
            read_position_records(&path, &mut positions)?;
        }

        // Compute every layer before storing anything, so a bad record or a
        // missing position leaves no half-annotated network behind.
        let work = layer_distances(metric, &positions, &self.to_links)?;
        let play = layer_distances(metric, &positions, &self.play)?;
        let weekend = layer_distances(metric, &positions, &self.weekend)?;

        for (node, position) in self.nodes.iter_mut().zip(positions) {
            node.position = position;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let layers = [
            (&mut self.to_links, work),
            (&mut self.play, play),
            (&mut self.weekend, weekend),
        ];
        for (links, distances) in layers {
            for (link, distance) in links.iter_mut().zip(distances) {
                link.distance = Some(distance);
                min = min.min(distance);
                max = max.max(distance);
            }
        }
        let (min, max) = if min.is_finite() {
            (min, max)
        } else {
            (0.0, 0.0)
        };

        self.min_max_distance = Some((min, max));
        self.params.dyn_dist_cutoff = max + 1.0;
        info!(
            "link distances span [{min}, {max}]; dynamic-distance cutoff set to {}",
            self.params.dyn_dist_cutoff
        );
        Ok(())
    }
}

fn layer_distances(
    metric: &dyn DistanceMetric,
    positions: &[Option<Position>],
    links: &[Link],
) -> Result<Vec<f64>, WardsimError> {
    links
        .iter()
        .map(|link| {
            let a = position_of(positions, link.from, link)?;
            let b = position_of(positions, link.to, link)?;
            Ok(metric.compute_distance(a, b))
        })
        .collect()
}

fn position_of(
    positions: &[Option<Position>],
    id: usize,
    link: &Link,
) -> Result<Position, WardsimError> {
    positions[id].ok_or_else(|| {
        WardsimError::MissingPositionData(format!(
            "node {id} carries no position (needed for the distance between {} and {})",
            link.from, link.to
        ))
    })
}

/// Reads `id,x,y` position records into the staged position table. Ids may
/// appear in any order and need not cover every node; a later record for the
/// same id overwrites an earlier one.
fn read_position_records(
    path: &Path,
    positions: &mut [Option<Position>],
) -> Result<(), WardsimError> {
    let mut reader = record_reader(path)?;

    for record in reader.records() {
        let record = record?;
        let line = record_line(&record);

        if record.len() != 3 {
            return Err(WardsimError::MalformedInputRecord(format!(
                "{}:{line}: position record has {} fields; expected `id,x,y`",
                path.display(),
                record.len()
            )));
        }

        let id = parse_node_id(&record, 0, "node id", positions.len(), path, line)?;
        let x = parse_coordinate(&record, 1, "x coordinate", path, line)?;
        let y = parse_coordinate(&record, 2, "y coordinate", path, line)?;
        positions[id] = Some(Position { x, y });
    }

    Ok(())
}
