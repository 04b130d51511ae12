//! Paths into a folder's on-disk control directory.

use std::path::{Path, PathBuf};

use crate::config::SynchronizerConfig;

/// Resolves the on-disk paths for one folder's control directory, given
/// the workspace's physical root and the folder's logical (workspace
/// relative) path.
#[derive(Debug, Clone)]
pub struct ControlDirLayout<'a> {
    config: &'a SynchronizerConfig,
    folder_physical_path: PathBuf,
}

impl<'a> ControlDirLayout<'a> {
    pub fn new(config: &'a SynchronizerConfig, folder_physical_path: PathBuf) -> Self {
        ControlDirLayout {
            config,
            folder_physical_path,
        }
    }

    pub fn control_dir(&self) -> PathBuf {
        self.folder_physical_path.join(&self.config.control_dir_name)
    }

    pub fn root_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.root)
    }

    pub fn repository_file(&self) -> PathBuf {
        self.control_dir()
            .join(&self.config.control_files.repository)
    }

    pub fn entries_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.entries)
    }

    pub fn tag_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.tag)
    }

    pub fn ignore_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.ignore)
    }

    pub fn notify_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.notify)
    }

    pub fn baserev_file(&self) -> PathBuf {
        self.control_dir().join(&self.config.control_files.baserev)
    }

    pub fn base_path(&self, file_name: &str) -> PathBuf {
        self.control_dir()
            .join(&self.config.control_files.base_dir)
            .join(file_name)
    }
}

/// Best-effort check that `candidate` resolves to somewhere under `root`.
/// On a canonicalization error the caller decides the conservative
/// fallback (see [`SynchronizerConfig::conservative_linked_folder_detection`]).
pub fn resolves_under_root(root: &Path, candidate: &Path) -> std::io::Result<bool> {
    let canonical_root = root.canonicalize()?;
    let canonical_candidate = match candidate.canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Not yet materialized on disk: fall back to a lexical check
            // against the (canonicalized) root plus the non-canonical tail.
            return Ok(candidate.starts_with(&canonical_root) || candidate.starts_with(root));
        }
        Err(e) => return Err(e),
    };
    Ok(canonical_candidate.starts_with(&canonical_root))
}
