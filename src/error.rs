use std::fmt::{self, Display, Formatter};

/// Crate-wide error type.
///
/// Construction-phase failures (network building, distance calculation, seed
/// loading) are fatal: they abort the whole operation and the caller never
/// sees a partially-built `Network`. `InvalidParameter` is per-call and
/// recoverable; the failing call leaves prior state unmodified.
#[derive(Debug)]
pub enum WardsimError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    /// A declared node or link ceiling was exceeded while loading.
    CapacityExceeded(String),
    /// A record could not be parsed into a valid node, link, or seed entry.
    MalformedInputRecord(String),
    /// A link or seed entry references a node id outside `[0, nnodes)`.
    OutOfRangeNodeId(String),
    /// A distance was requested for a node that has no position.
    MissingPositionData(String),
    /// An argument to a per-call operation was out of range.
    InvalidParameter(String),
    /// Building yielded a network with no nodes.
    EmptyNetwork(String),
}

impl From<std::io::Error> for WardsimError {
    fn from(error: std::io::Error) -> Self {
        WardsimError::IoError(error)
    }
}

impl From<csv::Error> for WardsimError {
    fn from(error: csv::Error) -> Self {
        WardsimError::CsvError(error)
    }
}

impl From<serde_json::Error> for WardsimError {
    fn from(error: serde_json::Error) -> Self {
        WardsimError::JsonError(error)
    }
}

impl Display for WardsimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WardsimError::IoError(error) => write!(f, "io error: {error}"),
            WardsimError::CsvError(error) => write!(f, "csv error: {error}"),
            WardsimError::JsonError(error) => write!(f, "json error: {error}"),
            WardsimError::CapacityExceeded(msg) => write!(f, "capacity exceeded: {msg}"),
            WardsimError::MalformedInputRecord(msg) => write!(f, "malformed input record: {msg}"),
            WardsimError::OutOfRangeNodeId(msg) => write!(f, "out-of-range node id: {msg}"),
            WardsimError::MissingPositionData(msg) => write!(f, "missing position data: {msg}"),
            WardsimError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            WardsimError::EmptyNetwork(msg) => write!(f, "empty network: {msg}"),
        }
    }
}

impl std::error::Error for WardsimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WardsimError::IoError(error) => Some(error),
            WardsimError::CsvError(error) => Some(error),
            WardsimError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}
