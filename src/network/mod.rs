/*!

The ward network: a node table plus the work, play, and weekend link tables,
with the counts and ceilings that bound them. A network is built once from
record files, optionally decorated with distances and seed nodes, and then
shared immutably by every simulation replica. The only supported mutations
after setup are the play-to-work rebalancing operations and
[`Network::reset_weights`], which restores the as-built state between replica
batches.

*/

mod builder;
mod distance;
mod link;
mod node;
mod rebalance;
mod seed;

pub use builder::{NetworkBuilder, WardsFileBuilder};
pub use distance::{DistanceMetric, Euclidean, GreatCircle};
pub use link::Link;
pub use node::{Node, Position};
pub use seed::read_seed_file;

use crate::error::WardsimError;
use crate::infections::Infections;
use crate::parameters::Parameters;
use crate::sampler::Sampler;

/// A ward network built from record files.
///
/// Node ids are dense indices into `nodes`, so `nodes[i].label == i`, link
/// endpoints index directly into the node table, and `nnodes`, `nlinks`, and
/// `plinks` are the exact observed counts, never the ceilings.
#[derive(Debug)]
pub struct Network {
    /// The wards, indexed by their canonical id.
    pub nodes: Vec<Node>,
    /// The work (commuting) links between wards, in file order.
    pub to_links: Vec<Link>,
    /// The play (random leisure movement) links between wards.
    pub play: Vec<Link>,
    /// The weekend links between wards.
    pub weekend: Vec<Link>,
    /// Number of nodes; always at most `max_nodes`.
    pub nnodes: usize,
    /// Number of work links; always at most `max_links`.
    pub nlinks: usize,
    /// Number of play links; always at most `max_links`.
    pub plinks: usize,
    /// Node ceiling declared when the network was built.
    pub max_nodes: usize,
    /// Per-layer link ceiling declared when the network was built.
    pub max_links: usize,
    /// Nodes pre-marked for infection seeding, in seed-file order with
    /// duplicates preserved. Empty until a seed file is loaded.
    pub to_seed: Vec<usize>,
    /// The run configuration the network was built from.
    pub params: Parameters,
    /// Cached (min, max) over all link distances. Written once by
    /// [`Network::add_distances`], never recomputed on read.
    min_max_distance: Option<(f64, f64)>,
    /// As-built weights, restored by [`Network::reset_weights`].
    saved: Option<SavedWeights>,
}

/// Snapshot of the as-built link weights and node aggregates, captured at the
/// end of construction so a mutated network can be rolled back.
#[derive(Debug)]
pub(crate) struct SavedWeights {
    work: Vec<f64>,
    play: Vec<f64>,
    node_work: Vec<f64>,
    node_play: Vec<f64>,
}

impl SavedWeights {
    pub(crate) fn capture(network: &Network) -> SavedWeights {
        SavedWeights {
            work: network.to_links.iter().map(|link| link.weight).collect(),
            play: network.play.iter().map(|link| link.weight).collect(),
            node_work: network.nodes.iter().map(|node| node.work_weight).collect(),
            node_play: network.nodes.iter().map(|node| node.play_weight).collect(),
        }
    }
}

impl Network {
    /// Builds a network from the record files in `params` using the default
    /// [`WardsFileBuilder`], bounded by the configured ceilings.
    pub fn build(params: Parameters) -> Result<Network, WardsimError> {
        Network::build_with(&WardsFileBuilder, params)
    }

    /// Builds a network with an injected builder, then runs the optional
    /// post-build steps: distance annotation whenever a position source is
    /// configured, and seed loading whenever a seed file is configured.
    pub fn build_with(
        builder: &dyn NetworkBuilder,
        params: Parameters,
    ) -> Result<Network, WardsimError> {
        let max_nodes = params.max_nodes;
        let max_links = params.max_links;
        let mut network = builder.build(params, max_nodes, max_links)?;

        let has_positions = network.params.input_files.position.is_some()
            || network.nodes.iter().any(|node| node.position.is_some());
        if has_positions {
            network.add_distances()?;
        }
        if let Some(seed_file) = network.params.input_files.seed.clone() {
            network.load_seed(&seed_file)?;
        }

        Ok(network)
    }

    /// Assembles a network from already-loaded tables. This is the only way
    /// to construct a [`Network`], so every builder ends up here.
    ///
    /// Node labels must equal their table index, every link endpoint must
    /// name a node in the table, weights must be finite and non-negative,
    /// and the tables must fit the declared ceilings. The node aggregates
    /// (`work_weight`, `play_weight`, `population`) are derived from the
    /// link tables here; values the caller put on the nodes are overwritten.
    pub fn from_tables(
        params: Parameters,
        max_nodes: usize,
        max_links: usize,
        mut nodes: Vec<Node>,
        to_links: Vec<Link>,
        play: Vec<Link>,
        weekend: Vec<Link>,
    ) -> Result<Network, WardsimError> {
        if nodes.is_empty() {
            return Err(WardsimError::EmptyNetwork(
                "the node table is empty".to_string(),
            ));
        }
        if nodes.len() > max_nodes {
            return Err(WardsimError::CapacityExceeded(format!(
                "{} nodes exceed the declared ceiling of {max_nodes}",
                nodes.len()
            )));
        }
        for (index, node) in nodes.iter().enumerate() {
            if node.label != index {
                return Err(WardsimError::MalformedInputRecord(format!(
                    "node at index {index} carries label {}; labels must equal their table index",
                    node.label
                )));
            }
        }

        for (layer, links) in [("work", &to_links), ("play", &play), ("weekend", &weekend)] {
            if links.len() > max_links {
                return Err(WardsimError::CapacityExceeded(format!(
                    "{} {layer} links exceed the declared ceiling of {max_links}",
                    links.len()
                )));
            }
            for link in links {
                if link.from >= nodes.len() || link.to >= nodes.len() {
                    return Err(WardsimError::OutOfRangeNodeId(format!(
                        "{layer} link ({}, {}) is outside the node table (nnodes = {})",
                        link.from,
                        link.to,
                        nodes.len()
                    )));
                }
                if !link.weight.is_finite() || link.weight < 0.0 {
                    return Err(WardsimError::MalformedInputRecord(format!(
                        "{layer} link ({}, {}) has weight {}; weights must be finite and non-negative",
                        link.from, link.to, link.weight
                    )));
                }
            }
        }

        for node in &mut nodes {
            node.work_weight = 0.0;
            node.play_weight = 0.0;
        }
        for link in &to_links {
            nodes[link.from].work_weight += link.weight;
        }
        for link in &play {
            nodes[link.from].play_weight += link.weight;
        }
        for node in &mut nodes {
            node.population = node.work_weight + node.play_weight;
        }

        let mut network = Network {
            nnodes: nodes.len(),
            nlinks: to_links.len(),
            plinks: play.len(),
            nodes,
            to_links,
            play,
            weekend,
            max_nodes,
            max_links,
            to_seed: Vec::new(),
            params,
            min_max_distance: None,
            saved: None,
        };
        network.saved = Some(SavedWeights::capture(&network));
        Ok(network)
    }

    /// The cached (min, max) over all link distances, or `None` before
    /// [`Network::add_distances`] has run.
    pub fn min_max_distances(&self) -> Option<(f64, f64)> {
        self.min_max_distance
    }

    /// Allocates zeroed per-replica infection state sized for this network
    /// and the configured number of disease classes.
    pub fn initialise_infections(&self) -> Infections {
        Infections::allocate(self.params.disease_classes, self.nnodes)
    }

    /// The master sampler for a run, seeded from the configured
    /// `random_seed` (system entropy when unset). Per-replica streams come
    /// from [`Sampler::replica`] on the returned handle.
    pub fn sampler(&self) -> Sampler {
        Sampler::new(self.params.random_seed)
    }

    /// Restores the as-built link weights and node aggregates, dropping any
    /// links the rebalancer created, so the next replica batch starts from
    /// the same network the record files described.
    pub fn reset_weights(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };

        self.to_links.truncate(saved.work.len());
        self.nlinks = self.to_links.len();
        for (link, weight) in self.to_links.iter_mut().zip(&saved.work) {
            link.weight = *weight;
        }
        for (link, weight) in self.play.iter_mut().zip(&saved.play) {
            link.weight = *weight;
        }
        for (node, (work, play)) in self
            .nodes
            .iter_mut()
            .zip(saved.node_work.iter().zip(&saved.node_play))
        {
            node.work_weight = *work;
            node.play_weight = *play;
            node.population = *work + *play;
        }

        self.saved = Some(saved);
    }
}
