/*!

Builds the node and link tables from the record files named in the run
configuration. The ceilings declared at build time bound what the loader will
accept; exceeding one is a fatal `CapacityExceeded`, never a silent
truncation. The loader only assembles tables; validation and finalization
live in [`Network::from_tables`], the single construction path shared with
injected builders.

*/

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};

use crate::error::WardsimError;
use crate::network::Network;
use crate::network::link::Link;
use crate::network::node::{Node, Position};
use crate::parameters::Parameters;

/// Strategy for constructing a [`Network`].
///
/// [`Network::build`] uses [`WardsFileBuilder`]; callers with records that
/// live somewhere other than the standard files implement this trait and
/// inject it through [`Network::build_with`]. An implementation assembles
/// its node and link tables however it likes and finishes with
/// [`Network::from_tables`], which owns validation, aggregate derivation,
/// and the as-built snapshot.
pub trait NetworkBuilder {
    /// Builds a network described by `params` within the declared ceilings.
    fn build(
        &self,
        params: Parameters,
        max_nodes: usize,
        max_links: usize,
    ) -> Result<Network, WardsimError>;
}

/// The default builder: reads the node table and the work/play/weekend link
/// tables from the comma-delimited record files in `params.input_files`.
pub struct WardsFileBuilder;

impl NetworkBuilder for WardsFileBuilder {
    fn build(
        &self,
        params: Parameters,
        max_nodes: usize,
        max_links: usize,
    ) -> Result<Network, WardsimError> {
        let input = params.input_files.clone();

        let nodes = read_node_records(&input.nodes, max_nodes)?;
        let nnodes = nodes.len();

        let to_links = read_link_records(&input.work, "work", nnodes, max_links)?;
        let play = match &input.play {
            Some(path) => read_link_records(path, "play", nnodes, max_links)?,
            None => Vec::new(),
        };
        let weekend = match &input.weekend {
            Some(path) => read_link_records(path, "weekend", nnodes, max_links)?,
            None => Vec::new(),
        };

        let network =
            Network::from_tables(params, max_nodes, max_links, nodes, to_links, play, weekend)?;
        info!(
            "built network: {} nodes, {} work links, {} play links, {} weekend links",
            network.nnodes,
            network.nlinks,
            network.plinks,
            network.weekend.len()
        );
        Ok(network)
    }
}

pub(super) fn record_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, WardsimError> {
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?)
}

pub(super) fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

pub(super) fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    path: &Path,
    line: u64,
) -> Result<T, WardsimError> {
    let raw = record.get(index).ok_or_else(|| {
        WardsimError::MalformedInputRecord(format!(
            "{}:{line}: missing {name} field",
            path.display()
        ))
    })?;

    raw.parse::<T>().map_err(|_| {
        WardsimError::MalformedInputRecord(format!(
            "{}:{line}: cannot parse {name} from {raw:?}",
            path.display()
        ))
    })
}

/// Parses a coordinate field. `nan` and `inf` parse as `f64` but would
/// poison every distance derived from them, so they are rejected here.
pub(super) fn parse_coordinate(
    record: &StringRecord,
    index: usize,
    name: &str,
    path: &Path,
    line: u64,
) -> Result<f64, WardsimError> {
    let value = parse_field::<f64>(record, index, name, path, line)?;
    if !value.is_finite() {
        return Err(WardsimError::MalformedInputRecord(format!(
            "{}:{line}: {name} {value} must be finite",
            path.display()
        )));
    }
    Ok(value)
}

/// Parses a node id field and bounds-checks it against the node table.
/// Negative values are integers but not valid ids, so they are out-of-range
/// rather than malformed.
pub(super) fn parse_node_id(
    record: &StringRecord,
    index: usize,
    name: &str,
    nnodes: usize,
    path: &Path,
    line: u64,
) -> Result<usize, WardsimError> {
    let id = parse_field::<i64>(record, index, name, path, line)?;
    if id < 0 || id as usize >= nnodes {
        return Err(WardsimError::OutOfRangeNodeId(format!(
            "{}:{line}: {name} {id} is outside the node table (nnodes = {nnodes})",
            path.display()
        )));
    }
    Ok(id as usize)
}

/// Reads the node table. Records are `id` or `id,x,y`; ids must be dense and
/// listed in order, so that the table index is the canonical ward identifier
/// and insertion order equals file order.
fn read_node_records(path: &Path, max_nodes: usize) -> Result<Vec<Node>, WardsimError> {
    let mut reader = record_reader(path)?;
    let mut nodes: Vec<Node> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record_line(&record);

        let id = parse_field::<usize>(&record, 0, "node id", path, line)?;
        if id != nodes.len() {
            return Err(WardsimError::MalformedInputRecord(format!(
                "{}:{line}: expected node id {}, found {id} (node records must be dense and in id order)",
                path.display(),
                nodes.len()
            )));
        }
        if id >= max_nodes {
            return Err(WardsimError::CapacityExceeded(format!(
                "node table in {} exceeds the declared ceiling of {max_nodes} nodes",
                path.display()
            )));
        }

        let mut node = Node::new(id);
        node.position = parse_inline_position(&record, path, line)?;
        nodes.push(node);
    }

    if nodes.is_empty() {
        return Err(WardsimError::EmptyNetwork(format!(
            "{} contains no node records",
            path.display()
        )));
    }

    nodes.shrink_to_fit();
    debug!("loaded {} nodes from {}", nodes.len(), path.display());
    Ok(nodes)
}

fn parse_inline_position(
    record: &StringRecord,
    path: &Path,
    line: u64,
) -> Result<Option<Position>, WardsimError> {
    match record.len() {
        1 => Ok(None),
        3 => {
            let x = parse_coordinate(record, 1, "x coordinate", path, line)?;
            let y = parse_coordinate(record, 2, "y coordinate", path, line)?;
            Ok(Some(Position { x, y }))
        }
        n => Err(WardsimError::MalformedInputRecord(format!(
            "{}:{line}: node record has {n} fields; expected `id` or `id,x,y`",
            path.display()
        ))),
    }
}

/// Reads one layer's link table. Records are `from,to,weight`; endpoints must
/// name nodes already in the table, and the layer may not exceed `max_links`
/// records.
fn read_link_records(
    path: &Path,
    layer: &'static str,
    nnodes: usize,
    max_links: usize,
) -> Result<Vec<Link>, WardsimError> {
    let mut reader = record_reader(path)?;
    let mut links: Vec<Link> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record_line(&record);

        if record.len() != 3 {
            return Err(WardsimError::MalformedInputRecord(format!(
                "{}:{line}: link record has {} fields; expected `from,to,weight`",
                path.display(),
                record.len()
            )));
        }

        let from = parse_node_id(&record, 0, "source node id", nnodes, path, line)?;
        let to = parse_node_id(&record, 1, "destination node id", nnodes, path, line)?;
        let weight = parse_field::<f64>(&record, 2, "weight", path, line)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(WardsimError::MalformedInputRecord(format!(
                "{}:{line}: link weight {weight} must be finite and non-negative",
                path.display()
            )));
        }

        if links.len() == max_links {
            return Err(WardsimError::CapacityExceeded(format!(
                "{layer} layer in {} exceeds the declared ceiling of {max_links} links",
                path.display()
            )));
        }

        links.push(Link::new(from, to, weight));
    }

    links.shrink_to_fit();
    debug!(
        "loaded {} {layer} links from {}",
        links.len(),
        path.display()
    );
    Ok(links)
}
