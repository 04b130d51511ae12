//! Disk store (C2): atomic per-folder control file I/O.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::codec::SyncBytes;
use crate::config::SynchronizerConfig;
use crate::disk::atomic::{delete_if_present, write_atomic};
use crate::disk::control_dir::{resolves_under_root, ControlDirLayout};
use crate::error::{Result, SyncError};
use crate::model::{BaserevInfo, FolderSync, IgnorePatterns, NotifyInfo};
use crate::resource::Resource;

/// The persistent half of the synchronizer: atomic reads/writes of a
/// folder's six control files, with linked-folder detection.
pub trait DiskStore: Send + Sync {
    fn is_linked(&self, folder: &Resource) -> bool;

    fn read_all_resource_sync(&self, folder: &Resource) -> Result<Option<(Vec<SyncBytes>, bool)>>;
    fn write_all_resource_sync(
        &self,
        folder: &Resource,
        entries: &[SyncBytes],
        is_static: bool,
    ) -> Result<()>;

    fn read_folder_sync(&self, folder: &Resource) -> Result<Option<FolderSync>>;
    fn write_folder_sync(&self, folder: &Resource, info: &FolderSync) -> Result<()>;
    fn delete_folder_sync(&self, folder: &Resource) -> Result<()>;

    fn read_cvs_ignore(&self, folder: &Resource) -> Result<Option<IgnorePatterns>>;
    fn write_cvs_ignore(&self, folder: &Resource, patterns: &IgnorePatterns) -> Result<()>;

    fn read_all_notify(&self, folder: &Resource) -> Result<Vec<NotifyInfo>>;
    fn write_all_notify(&self, folder: &Resource, entries: &[NotifyInfo]) -> Result<()>;

    fn read_all_baserev(&self, folder: &Resource) -> Result<Vec<BaserevInfo>>;
    fn write_all_baserev(&self, folder: &Resource, entries: &[BaserevInfo]) -> Result<()>;

    fn is_edited(&self, file: &Resource) -> bool;
    fn copy_to_base(&self, file: &Resource) -> Result<()>;
    fn restore_from_base(&self, file: &Resource) -> Result<()>;
    fn delete_base(&self, file: &Resource) -> Result<()>;

    /// Where `folder` actually lives on disk: `workspace_root.join(folder.path())`
    /// unless it has been registered as a linked folder.
    fn physical_path(&self, folder: &Resource) -> PathBuf;
    fn register_linked_folder(&self, folder: &Resource, physical_path: PathBuf);
    fn unregister_linked_folder(&self, folder: &Resource);
}

/// Real, filesystem-backed [`DiskStore`].
pub struct RealDiskStore {
    workspace_root: PathBuf,
    config: SynchronizerConfig,
    /// Logical folder path -> physical location, for folders whose
    /// storage lives outside `workspace_root` (linked folders).
    linked_folders: DashMap<PathBuf, PathBuf>,
}

impl RealDiskStore {
    pub fn new(workspace_root: impl Into<PathBuf>, config: SynchronizerConfig) -> Self {
        RealDiskStore {
            workspace_root: workspace_root.into(),
            config,
            linked_folders: DashMap::new(),
        }
    }

    fn physical_path_inner(&self, folder: &Resource) -> PathBuf {
        if let Some(entry) = self.linked_folders.get(folder.path()) {
            entry.value().clone()
        } else {
            self.workspace_root.join(folder.path())
        }
    }

    fn layout(&self, folder: &Resource) -> ControlDirLayout<'_> {
        ControlDirLayout::new(&self.config, self.physical_path_inner(folder))
    }

    fn read_lines(&self, path: &Path) -> Result<Option<Vec<String>>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(
                contents.lines().map(|l| l.to_string()).collect::<Vec<_>>(),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::io(path, e)),
        }
    }
}

impl DiskStore for RealDiskStore {
    fn is_linked(&self, folder: &Resource) -> bool {
        let Some(entry) = self.linked_folders.get(folder.path()) else {
            return false;
        };
        let physical = entry.value().clone();
        drop(entry);
        match resolves_under_root(&self.workspace_root, &physical) {
            Ok(under_root) => !under_root,
            Err(e) => {
                warn!(
                    folder = %folder,
                    error = %e,
                    "linked-folder detection failed; falling back conservatively"
                );
                !self.config.conservative_linked_folder_detection
            }
        }
    }

    fn read_all_resource_sync(&self, folder: &Resource) -> Result<Option<(Vec<SyncBytes>, bool)>> {
        if self.is_linked(folder) {
            return Ok(None);
        }
        let layout = self.layout(folder);
        let Some(lines) = self.read_lines(&layout.entries_file())? else {
            return Ok(None);
        };
        let mut entries = Vec::with_capacity(lines.len());
        let mut is_static = false;
        for line in lines {
            if line == "D" {
                is_static = true;
                continue;
            }
            if let Some(rest) = line.strip_prefix('/').or_else(|| line.strip_prefix('D')) {
                entries.push(rest.as_bytes().to_vec());
            } else if !line.is_empty() {
                warn!(folder = %folder, line = %line, "ignoring malformed Entries line");
            }
        }
        debug!(folder = %folder, count = entries.len(), "loaded Entries from disk");
        Ok(Some((entries, is_static)))
    }

    fn write_all_resource_sync(
        &self,
        folder: &Resource,
        entries: &[SyncBytes],
        is_static: bool,
    ) -> Result<()> {
        if self.is_linked(folder) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(folder),
            ));
        }
        let layout = self.layout(folder);
        let mut contents = String::new();
        for bytes in entries {
            let is_folder_entry = crate::codec::is_folder(bytes);
            let text = String::from_utf8_lossy(bytes);
            if is_folder_entry {
                contents.push('D');
            } else {
                contents.push('/');
            }
            contents.push_str(&text);
            contents.push('\n');
        }
        if is_static {
            contents.push_str("D\n");
        }
        write_atomic(&layout.entries_file(), contents.as_bytes())
    }

    fn read_folder_sync(&self, folder: &Resource) -> Result<Option<FolderSync>> {
        if self.is_linked(folder) {
            return Ok(None);
        }
        let layout = self.layout(folder);
        let Some(root_lines) = self.read_lines(&layout.root_file())? else {
            return Ok(None);
        };
        let repository_relative_path = self
            .read_lines(&layout.repository_file())?
            .and_then(|l| l.into_iter().next())
            .unwrap_or_default();
        let tag = self
            .read_lines(&layout.tag_file())?
            .and_then(|l| l.into_iter().next())
            .and_then(|l| FolderSync::parse_tag_line(&l));
        let (_, is_static) = self
            .read_all_resource_sync(folder)?
            .unwrap_or((Vec::new(), false));
        Ok(Some(FolderSync {
            repository: root_lines.into_iter().next().unwrap_or_default(),
            repository_relative_path,
            tag,
            is_static,
        }))
    }

    fn write_folder_sync(&self, folder: &Resource, info: &FolderSync) -> Result<()> {
        if self.is_linked(folder) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(folder),
            ));
        }
        let layout = self.layout(folder);
        write_atomic(
            &layout.root_file(),
            format!("{}\n", info.repository).as_bytes(),
        )?;
        write_atomic(
            &layout.repository_file(),
            format!("{}\n", info.repository_relative_path).as_bytes(),
        )?;
        match info.tag_line() {
            Some(line) => write_atomic(&layout.tag_file(), format!("{line}\n").as_bytes())?,
            None => delete_if_present(&layout.tag_file())?,
        }
        Ok(())
    }

    fn delete_folder_sync(&self, folder: &Resource) -> Result<()> {
        if self.is_linked(folder) {
            return Ok(());
        }
        let layout = self.layout(folder);
        delete_if_present(&layout.root_file())?;
        delete_if_present(&layout.repository_file())?;
        delete_if_present(&layout.tag_file())?;
        Ok(())
    }

    fn read_cvs_ignore(&self, folder: &Resource) -> Result<Option<IgnorePatterns>> {
        if self.is_linked(folder) {
            return Ok(None);
        }
        let layout = self.layout(folder);
        match std::fs::read_to_string(layout.ignore_file()) {
            Ok(contents) => Ok(Some(IgnorePatterns::parse(&contents))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::io(layout.ignore_file(), e)),
        }
    }

    fn write_cvs_ignore(&self, folder: &Resource, patterns: &IgnorePatterns) -> Result<()> {
        if self.is_linked(folder) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(folder),
            ));
        }
        let layout = self.layout(folder);
        write_atomic(&layout.ignore_file(), patterns.render().as_bytes())
    }

    fn read_all_notify(&self, folder: &Resource) -> Result<Vec<NotifyInfo>> {
        if self.is_linked(folder) {
            return Ok(Vec::new());
        }
        let layout = self.layout(folder);
        let lines = self.read_lines(&layout.notify_file())?.unwrap_or_default();
        Ok(lines.iter().filter_map(|l| NotifyInfo::parse(l)).collect())
    }

    fn write_all_notify(&self, folder: &Resource, entries: &[NotifyInfo]) -> Result<()> {
        if self.is_linked(folder) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(folder),
            ));
        }
        let layout = self.layout(folder);
        if entries.is_empty() {
            return delete_if_present(&layout.notify_file());
        }
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&entry.render());
            contents.push('\n');
        }
        write_atomic(&layout.notify_file(), contents.as_bytes())
    }

    fn read_all_baserev(&self, folder: &Resource) -> Result<Vec<BaserevInfo>> {
        if self.is_linked(folder) {
            return Ok(Vec::new());
        }
        let layout = self.layout(folder);
        let lines = self.read_lines(&layout.baserev_file())?.unwrap_or_default();
        Ok(lines.iter().filter_map(|l| BaserevInfo::parse(l)).collect())
    }

    fn write_all_baserev(&self, folder: &Resource, entries: &[BaserevInfo]) -> Result<()> {
        if self.is_linked(folder) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(folder),
            ));
        }
        let layout = self.layout(folder);
        if entries.is_empty() {
            return delete_if_present(&layout.baserev_file());
        }
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&entry.render());
            contents.push('\n');
        }
        write_atomic(&layout.baserev_file(), contents.as_bytes())
    }

    fn is_edited(&self, file: &Resource) -> bool {
        let Some(parent) = file.parent() else {
            return false;
        };
        let layout = self.layout(&parent);
        layout.base_path(file.name()).exists()
    }

    fn copy_to_base(&self, file: &Resource) -> Result<()> {
        let Some(parent) = file.parent() else {
            return Err(SyncError::InvalidScope(
                "file has no parent folder".to_string(),
            ));
        };
        if self.is_linked(&parent) {
            return Err(SyncError::LinkedFolderNotWritable(
                self.physical_path_inner(&parent),
            ));
        }
        let layout = self.layout(&parent);
        let working_path = self.physical_path_inner(&parent).join(file.name());
        let contents = std::fs::read(&working_path).map_err(|e| SyncError::io(&working_path, e))?;
        write_atomic(&layout.base_path(file.name()), &contents)
    }

    fn restore_from_base(&self, file: &Resource) -> Result<()> {
        let Some(parent) = file.parent() else {
            return Err(SyncError::InvalidScope(
                "file has no parent folder".to_string(),
            ));
        };
        let layout = self.layout(&parent);
        let base_path = layout.base_path(file.name());
        let contents = std::fs::read(&base_path).map_err(|e| SyncError::io(&base_path, e))?;
        let working_path = self.physical_path_inner(&parent).join(file.name());
        write_atomic(&working_path, &contents)
    }

    fn delete_base(&self, file: &Resource) -> Result<()> {
        let Some(parent) = file.parent() else {
            return Ok(());
        };
        let layout = self.layout(&parent);
        delete_if_present(&layout.base_path(file.name()))
    }

    fn physical_path(&self, folder: &Resource) -> PathBuf {
        self.physical_path_inner(folder)
    }

    /// See Design Note (b): the exact linked-folder predicate is left to
    /// the embedding filesystem abstraction; this crate resolves it by
    /// registration plus a root-containment check.
    fn register_linked_folder(&self, folder: &Resource, physical_path: PathBuf) {
        self.linked_folders
            .insert(folder.path().to_path_buf(), physical_path);
    }

    fn unregister_linked_folder(&self, folder: &Resource) {
        self.linked_folders.remove(folder.path());
    }
}
