//! Typed, defaulted configuration (C9).
//!
//! Every field has a sane default and the whole struct is
//! `serde`-deserializable so a host application can load overrides from
//! whatever configuration format it already uses, without this crate
//! taking a dependency on one.

use serde::{Deserialize, Serialize};

/// Names of the six control files within a folder's control directory.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ControlFileNames {
    pub root: String,
    pub repository: String,
    pub entries: String,
    pub tag: String,
    pub ignore: String,
    pub notify: String,
    pub baserev: String,
    pub base_dir: String,
}

impl Default for ControlFileNames {
    fn default() -> Self {
        ControlFileNames {
            root: "Root".to_string(),
            repository: "Repository".to_string(),
            entries: "Entries".to_string(),
            tag: "Tag".to_string(),
            ignore: ".cvsignore".to_string(),
            notify: "Notify".to_string(),
            baserev: "Baserev".to_string(),
            base_dir: "Base".to_string(),
        }
    }
}

/// Global knobs that tune synchronizer behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynchronizerConfig {
    /// Name of the control directory within each managed folder (default `"CVS"`).
    pub control_dir_name: String,
    /// Names of the files within the control directory.
    pub control_files: ControlFileNames,
    /// When linked-folder detection hits an I/O error, treat the folder
    /// as *not linked* rather than refusing to read/write it (§5).
    pub conservative_linked_folder_detection: bool,
    /// Advisory soft cap on how many folders' sync the session cache
    /// keeps `loaded` before a caller-triggered purge is recommended.
    /// The cache never silently evicts correctness-relevant state; this
    /// only affects when `Synchronizer::loaded_folder_count` crosses a
    /// threshold a caller may want to react to.
    pub loaded_folder_soft_cap: usize,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        SynchronizerConfig {
            control_dir_name: "CVS".to_string(),
            control_files: ControlFileNames::default(),
            conservative_linked_folder_detection: true,
            loaded_folder_soft_cap: 4096,
        }
    }
}
