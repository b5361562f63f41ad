pub mod error;
pub mod infections;
pub mod log;
pub mod network;
pub mod parameters;
pub mod sampler;

pub use error::WardsimError;
pub use infections::Infections;
pub use network::{
    DistanceMetric, Euclidean, GreatCircle, Link, Network, NetworkBuilder, Node, Position,
    WardsFileBuilder, read_seed_file,
};
pub use parameters::{InputFiles, Parameters};
pub use sampler::Sampler;

// `crate::` keeps the facade distinct from the `log` crate it wraps.
pub use crate::log::{disable_logging, enable_logging, set_log_level};
