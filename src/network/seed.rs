/*!

Infection seeding input. A seed file is a flat list of node ids to pre-mark
as infected; the transition model consumes them in file order, so order and
duplicates are preserved exactly as written.

*/

use std::path::Path;

use log::info;

use crate::error::WardsimError;
use crate::network::Network;

/// Reads a seed file into the raw list of node ids.
///
/// Tokens are separated by commas or whitespace (including newlines), one
/// seed event per token. Range checking is left to [`Network::load_seed`];
/// this keeps the reader usable for inspecting a file against no particular
/// network.
pub fn read_seed_file(path: &Path) -> Result<Vec<i64>, WardsimError> {
    let contents = std::fs::read_to_string(path)?;

    contents
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                WardsimError::MalformedInputRecord(format!(
                    "{}: cannot parse seed node id from {token:?}",
                    path.display()
                ))
            })
        })
        .collect()
}

impl Network {
    /// Reads the seed file at `path` and attaches its node ids to `to_seed`.
    ///
    /// Every id is validated against the node table before anything is
    /// attached; on failure `to_seed` keeps whatever it held before the call.
    pub fn load_seed(&mut self, path: &Path) -> Result<(), WardsimError> {
        let raw = read_seed_file(path)?;

        let mut seeds = Vec::with_capacity(raw.len());
        for id in raw {
            if id < 0 || id as usize >= self.nnodes {
                return Err(WardsimError::OutOfRangeNodeId(format!(
                    "{}: seed node id {id} is outside the node table (nnodes = {})",
                    path.display(),
                    self.nnodes
                )));
            }
            seeds.push(id as usize);
        }

        info!("loaded {} seed events from {}", seeds.len(), path.display());
        self.to_seed = seeds;
        Ok(())
    }
}
