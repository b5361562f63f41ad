/*!

The shared run configuration. A run describes where its input records live and
the resource ceilings the build must respect; everything else in the crate
reads (and in one documented case, writes) these values through the `Network`
that owns them.

*/

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WardsimError;

/// Paths to the record files a network is built from. The required files are
/// the node table and the work layer; every other source is optional and its
/// absence leaves the corresponding layer empty (or skips the step).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputFiles {
    /// Node records, `id[,x,y]`, dense and listed in id order.
    pub nodes: PathBuf,
    /// Work (commuting) link records, `from,to,weight`.
    pub work: PathBuf,
    /// Play (leisure) link records, `from,to,weight`.
    #[serde(default)]
    pub play: Option<PathBuf>,
    /// Weekend link records, `from,to,weight`.
    #[serde(default)]
    pub weekend: Option<PathBuf>,
    /// Node positions, `id,x,y`, read by the distance calculator. When absent
    /// the calculator falls back to positions carried on the node records.
    #[serde(default)]
    pub position: Option<PathBuf>,
    /// Node ids to pre-mark for infection, one seed event per token.
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

/// Parameters for one run. Deserializable from JSON via [`Parameters::from_file`];
/// every field except `input_files` has a usable default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameters {
    pub input_files: InputFiles,

    /// Ceiling on the number of nodes a build may load. A validation bound on
    /// peak working memory, not the final size.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Ceiling on the number of link records any single layer may load.
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Maximum inter-ward distance considered by spatially-decaying
    /// transmission. `Network::add_distances` rewrites this to one past the
    /// largest observed link distance.
    #[serde(default = "default_dyn_dist_cutoff")]
    pub dyn_dist_cutoff: f64,

    /// How many disease compartments the transmission model tracks per ward.
    #[serde(default = "default_disease_classes")]
    pub disease_classes: usize,

    /// Explicit random seed for the run. `None` lets the sampler draw one
    /// from system entropy (and report it).
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_max_nodes() -> usize {
    10050
}

fn default_max_links() -> usize {
    2_414_000
}

fn default_dyn_dist_cutoff() -> f64 {
    10000.0
}

fn default_disease_classes() -> usize {
    5
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            input_files: InputFiles::default(),
            max_nodes: default_max_nodes(),
            max_links: default_max_links(),
            dyn_dist_cutoff: default_dyn_dist_cutoff(),
            disease_classes: default_disease_classes(),
            random_seed: None,
        }
    }
}

impl Parameters {
    /// Loads a run configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Parameters, WardsimError> {
        let file = File::open(path.as_ref())?;
        let parameters = serde_json::from_reader(BufReader::new(file))?;
        Ok(parameters)
    }
}
