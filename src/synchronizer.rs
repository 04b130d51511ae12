//! Synchronizer facade (C7): the public surface every caller goes
//! through. Every mutating operation follows the same scaffold —
//! begin batch, begin op, load on demand, mutate, end op, end batch —
//! via [`BatchLock`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::batch::{BatchLock, ChangeSet, FlushCallback};
use crate::broadcaster::{Broadcaster, SyncChangeListener};
use crate::cache::{Caches, ResourceCache};
use crate::codec;
use crate::config::SynchronizerConfig;
use crate::disk::store::{DiskStore, RealDiskStore};
use crate::dirty_propagator;
use crate::error::{FolderCommitError, Result, SyncError};
use crate::model::{BaserevInfo, DirtyIndicator, FolderSync, ModificationState, NotifyInfo, ResourceSync};
use crate::monitor::{NullMonitor, ProgressMonitor};
use crate::resource::{Resource, ResourceKind};

static GLOBAL: OnceCell<Synchronizer> = OnceCell::new();

/// Thread-safe workspace synchronizer. One instance owns the caches,
/// the disk store, and the batch lock for a single workspace root.
pub struct Synchronizer {
    root: PathBuf,
    config: SynchronizerConfig,
    disk: Arc<dyn DiskStore>,
    caches: Arc<Caches>,
    batch_lock: Arc<BatchLock>,
    broadcaster: Arc<Broadcaster>,
}

impl Synchronizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, SynchronizerConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: SynchronizerConfig) -> Self {
        let root = root.into();
        let disk: Arc<dyn DiskStore> = Arc::new(RealDiskStore::new(root.clone(), config.clone()));
        Synchronizer {
            root,
            config,
            disk,
            caches: Arc::new(Caches::new()),
            batch_lock: Arc::new(BatchLock::new()),
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }

    /// Install `self` as the process-wide singleton. Fails (returning
    /// the instance back) if one is already installed. Prefer
    /// constructing and threading an owned `Synchronizer` explicitly;
    /// this exists for call sites that can't easily do that.
    pub fn install_global(self) -> std::result::Result<(), Synchronizer> {
        GLOBAL.set(self)
    }

    pub fn global() -> Option<&'static Synchronizer> {
        GLOBAL.get()
    }

    pub fn config(&self) -> &SynchronizerConfig {
        &self.config
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn add_listener(&self, listener: Arc<dyn SyncChangeListener>) {
        self.broadcaster.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn SyncChangeListener>) {
        self.broadcaster.remove_listener(listener);
    }

    pub fn register_linked_folder(&self, folder: &Resource, physical_path: impl Into<PathBuf>) {
        self.disk
            .register_linked_folder(folder, physical_path.into());
    }

    pub fn unregister_linked_folder(&self, folder: &Resource) {
        self.disk.unregister_linked_folder(folder);
    }

    fn exists(&self, r: &Resource) -> bool {
        if r.is_root() {
            true
        } else {
            self.root.join(r.path()).exists()
        }
    }

    fn cache_for(&self, r: &Resource) -> &dyn ResourceCache {
        self.caches.cache_for(self.exists(r))
    }

    /// Run `f` under the op lock, opening an ad hoc single-operation
    /// batch scoped to `rule` if the calling thread has none open yet.
    /// A caller that already holds a wider batch simply nests into it.
    fn run_in_batch<R>(&self, rule: &Resource, f: impl FnOnce() -> Result<R>) -> Result<R> {
        if self.batch_lock.is_within_active_thread(rule) {
            return self.batch_lock.with_op_lock(f);
        }
        self.batch_lock.acquire(rule, self.flush_callback())?;
        let op_result = self.batch_lock.with_op_lock(f);
        let release_result = self.batch_lock.release(&NullMonitor);
        op_result.and_then(|value| release_result.map(|()| value))
    }

    fn flush_callback(&self) -> FlushCallback {
        let disk = self.disk.clone();
        let caches = self.caches.clone();
        let broadcaster = self.broadcaster.clone();
        let root = self.root.clone();
        Box::new(move |change_set, _monitor: &dyn ProgressMonitor| {
            run_flush(&disk, &caches, &broadcaster, &root, change_set)
        })
    }

    /// Loads a folder's folder-sync, ignore patterns, and every
    /// child's sync bytes from disk into cache, exactly once per
    /// folder per session.
    fn ensure_folder_loaded(&self, folder: &Resource) -> Result<()> {
        if folder.is_root() {
            return Ok(());
        }
        let cache = self.cache_for(folder);
        if cache.is_sync_loaded(folder) {
            return Ok(());
        }
        self.batch_lock.with_op_lock(|| -> Result<()> {
            if cache.is_sync_loaded(folder) {
                return Ok(());
            }
            if let Some(folder_sync) = self.disk.read_folder_sync(folder)? {
                cache.set_folder_sync(folder, folder_sync);
            }
            if let Some(ignore) = self.disk.read_cvs_ignore(folder)? {
                cache.set_ignore_patterns(folder, ignore);
            }
            if let Some((entries, _is_static)) = self.disk.read_all_resource_sync(folder)? {
                for bytes in entries {
                    let name = codec::name_of(&bytes).unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    let child = if codec::is_folder(&bytes) {
                        folder.child_folder(&name)
                    } else {
                        folder.child_file(&name)
                    };
                    self.cache_for(&child).set_sync_bytes(&child, bytes);
                }
            }
            cache.mark_sync_loaded(folder);
            debug!(folder = %folder, "loaded folder sync from disk");
            Ok(())
        })
    }

    // -- resource sync --------------------------------------------------

    pub fn get_sync_bytes(&self, r: &Resource) -> Result<Option<codec::SyncBytes>> {
        let Some(parent) = r.parent() else {
            return Ok(None);
        };
        self.ensure_folder_loaded(&parent)?;
        Ok(self.cache_for(r).get_sync_bytes(r))
    }

    pub fn get_resource_sync(&self, r: &Resource) -> Result<Option<ResourceSync>> {
        Ok(self.get_sync_bytes(r)?.map(|b| ResourceSync::decode_lenient(&b)))
    }

    pub fn set_sync_bytes(&self, r: &Resource, bytes: codec::SyncBytes) -> Result<()> {
        let parent = require_non_root_parent(r)?;
        self.run_in_batch(&parent, || {
            self.ensure_folder_loaded(&parent)?;
            self.cache_for(r).set_sync_bytes(r, bytes);
            self.batch_lock.record_resource_changed(r);
            Ok(())
        })
    }

    pub fn set_resource_sync(&self, r: &Resource, info: &ResourceSync) -> Result<()> {
        self.set_sync_bytes(r, info.to_bytes())
    }

    pub fn delete_resource_sync(&self, r: &Resource) -> Result<()> {
        let parent = require_non_root_parent(r)?;
        self.run_in_batch(&parent, || {
            self.ensure_folder_loaded(&parent)?;
            let cache = self.cache_for(r);
            if cache.remove_sync_bytes(r).is_some() {
                cache.flush_dirty(r);
                dirty_propagator::adjust(
                    &self.caches,
                    |res| self.exists(res),
                    &parent,
                    DirtyIndicator::Recompute,
                );
                self.batch_lock.record_resource_changed(r);
            }
            Ok(())
        })
    }

    // -- dirty indicator --------------------------------------------------

    /// Mark `r` dirty and propagate up the ancestor chain per §4.4.
    pub fn mark_dirty(&self, r: &Resource) {
        self.batch_lock.with_op_lock(|| {
            dirty_propagator::adjust(&self.caches, |res| self.exists(res), r, DirtyIndicator::IsDirty);
        });
    }

    /// Mark `r` clean. Ancestors collapse to `RECOMPUTE` rather than
    /// clean, since a sibling could still be dirty.
    pub fn mark_not_dirty(&self, r: &Resource) {
        self.batch_lock.with_op_lock(|| {
            dirty_propagator::adjust(&self.caches, |res| self.exists(res), r, DirtyIndicator::NotDirty);
        });
    }

    pub fn modification_state(&self, r: &Resource) -> ModificationState {
        self.batch_lock
            .with_op_lock(|| dirty_propagator::get_modification_state(&self.caches, |res| self.exists(res), r))
    }

    // -- folder sync ------------------------------------------------------

    pub fn get_folder_sync(&self, f: &Resource) -> Result<Option<FolderSync>> {
        if f.is_root() {
            return Ok(None);
        }
        self.ensure_folder_loaded(f)?;
        Ok(self.cache_for(f).get_folder_sync(f))
    }

    pub fn set_folder_sync(&self, f: &Resource, info: FolderSync) -> Result<()> {
        if f.is_root() {
            return Err(SyncError::InvalidScope(
                "cannot set folder sync on the workspace root".to_string(),
            ));
        }
        self.run_in_batch(f, || {
            self.ensure_folder_loaded(f)?;
            let cache = self.cache_for(f);
            let was_absent = cache.get_folder_sync(f).is_none();
            cache.set_folder_sync(f, info);
            if was_absent {
                dirty_propagator::adjust(
                    &self.caches,
                    |res| self.exists(res),
                    f,
                    DirtyIndicator::Recompute,
                );
            }
            self.batch_lock.record_folder_changed(f);
            Ok(())
        })
    }

    pub fn delete_folder_sync(&self, f: &Resource) -> Result<()> {
        self.run_in_batch(f, || {
            self.ensure_folder_loaded(f)?;
            for child in self.members(f)? {
                let cache = self.cache_for(&child);
                if cache.remove_sync_bytes(&child).is_some() {
                    self.batch_lock.record_resource_changed(&child);
                }
            }
            self.cache_for(f).remove_folder_sync(f);
            self.batch_lock.record_folder_changed(f);
            Ok(())
        })
    }

    // -- ignores ------------------------------------------------------------

    pub fn is_ignored(&self, r: &Resource) -> Result<bool> {
        if r.is_root() || r.is_project() || !self.exists(r) {
            return Ok(false);
        }
        let Some(parent) = r.parent() else {
            return Ok(false);
        };
        self.ensure_folder_loaded(&parent)?;
        let patterns = self
            .cache_for(&parent)
            .get_ignore_patterns(&parent)
            .unwrap_or_default();
        Ok(patterns.matches(r.name()))
    }

    pub fn add_ignored(&self, f: &Resource, pattern: &str) -> Result<()> {
        self.run_in_batch(f, || {
            self.ensure_folder_loaded(f)?;
            let cache = self.cache_for(f);
            let mut patterns = cache.get_ignore_patterns(f).unwrap_or_default();
            if patterns.add_unique(pattern) {
                self.disk.write_cvs_ignore(f, &patterns)?;
                cache.set_ignore_patterns(f, patterns);
                self.batch_lock.record_ignore_file_change(f);
                for child in self.unmanaged_children(f)? {
                    self.batch_lock.record_resource_changed(&child);
                }
            }
            Ok(())
        })
    }

    fn unmanaged_children(&self, folder: &Resource) -> Result<Vec<Resource>> {
        let mut out = Vec::new();
        for child in self.list_physical_children(folder)? {
            if self.cache_for(&child).get_sync_bytes(&child).is_none() {
                out.push(child);
            }
        }
        Ok(out)
    }

    fn list_physical_children(&self, folder: &Resource) -> Result<Vec<Resource>> {
        let physical = self.disk.physical_path(folder);
        let mut out = Vec::new();
        let read_dir = match std::fs::read_dir(&physical) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(SyncError::io(&physical, e)),
        };
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::io(&physical, e))?;
            let Some(name) = entry.file_name().to_str().map(|s| s.to_string()) else {
                continue;
            };
            if name == self.config.control_dir_name {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            out.push(if is_dir {
                folder.child_folder(&name)
            } else {
                folder.child_file(&name)
            });
        }
        Ok(out)
    }

    // -- members / load probing ---------------------------------------------

    pub fn members(&self, f: &Resource) -> Result<Vec<Resource>> {
        self.ensure_folder_loaded(f)?;
        let mut names = std::collections::BTreeSet::new();
        for bytes in self.caches.session.children_sync_bytes(f) {
            if let Ok(name) = codec::name_of(&bytes) {
                if !name.is_empty() {
                    names.insert(name);
                }
            }
        }
        for bytes in self.caches.phantom.children_sync_bytes(f) {
            if let Ok(name) = codec::name_of(&bytes) {
                if !name.is_empty() {
                    names.insert(name);
                }
            }
        }
        Ok(names
            .into_iter()
            .map(|name| {
                let child_path = f.path().join(&name);
                let as_folder = Resource::folder(child_path.clone());
                if self.caches.session.get_folder_sync(&as_folder).is_some()
                    || self.caches.phantom.get_folder_sync(&as_folder).is_some()
                {
                    as_folder
                } else {
                    Resource::file(child_path)
                }
            })
            .collect())
    }

    pub fn is_sync_info_loaded(&self, resources: &[Resource], depth: usize) -> bool {
        resources.iter().all(|r| self.is_loaded_to_depth(r, depth))
    }

    fn is_loaded_to_depth(&self, r: &Resource, depth: usize) -> bool {
        if !self.cache_for(r).is_sync_loaded(r) {
            return false;
        }
        if depth == 0 {
            return true;
        }
        match self.members(r) {
            Ok(children) => children.iter().all(|c| self.is_loaded_to_depth(c, depth - 1)),
            Err(_) => false,
        }
    }

    pub fn ensure_sync_info_loaded(&self, resources: &[Resource], depth: usize) -> Result<()> {
        for r in resources {
            self.ensure_loaded_to_depth(r, depth)?;
        }
        Ok(())
    }

    fn ensure_loaded_to_depth(&self, r: &Resource, depth: usize) -> Result<()> {
        self.ensure_folder_loaded(r)?;
        if depth == 0 {
            return Ok(());
        }
        for child in self.members(r)? {
            if child.kind().is_folder_like() {
                self.ensure_loaded_to_depth(&child, depth - 1)?;
            }
        }
        Ok(())
    }

    // -- deletion / move lifecycle --------------------------------------------

    pub fn prepare_for_deletion(&self, r: &Resource) -> Result<()> {
        let rule = r.parent().unwrap_or_else(Resource::workspace_root);
        self.run_in_batch(&rule, || {
            dirty_propagator::adjust(
                &self.caches,
                |res| self.exists(res),
                r,
                DirtyIndicator::Recompute,
            );
            match r.kind() {
                ResourceKind::File => {
                    if let Some(bytes) = self.caches.session.get_sync_bytes(r) {
                        if codec::is_addition(&bytes) {
                            self.caches.session.remove_sync_bytes(r);
                        } else if let Ok(deletion_bytes) = codec::convert_to_deletion(&bytes) {
                            self.caches.session.remove_sync_bytes(r);
                            self.caches.phantom.set_sync_bytes(r, deletion_bytes);
                        }
                    }
                }
                ResourceKind::Project => {
                    self.caches.phantom.clear();
                }
                ResourceKind::Folder => {
                    if let Some(folder_sync) = self.caches.session.remove_folder_sync(r) {
                        self.caches.phantom.set_folder_sync(r, folder_sync);
                    }
                    if let Some(bytes) = self.caches.session.remove_sync_bytes(r) {
                        self.caches.phantom.set_sync_bytes(r, bytes);
                    }
                }
                ResourceKind::WorkspaceRoot => {}
            }
            Ok(())
        })
    }

    pub fn prepare_for_move_delete(&self, r: &Resource, monitor: &dyn ProgressMonitor) -> Result<()> {
        self.visit_subtree_depth_first(r, monitor)?;
        self.caches.session.purge(r);
        Ok(())
    }

    fn visit_subtree_depth_first(&self, r: &Resource, monitor: &dyn ProgressMonitor) -> Result<()> {
        if monitor.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        if r.kind().is_folder_like() && !r.is_root() {
            for child in self.members(r)? {
                self.visit_subtree_depth_first(&child, monitor)?;
            }
        }
        self.prepare_for_deletion(r)
    }

    pub fn handle_deleted(&self, r: &Resource) -> Result<()> {
        if !self.exists(r) {
            dirty_propagator::adjust(&self.caches, |res| self.exists(res), r, DirtyIndicator::Recompute);
        }
        Ok(())
    }

    // -- flush / deconfigure / external edits ---------------------------------

    #[instrument(skip(self, monitor), fields(folder = %f))]
    pub fn flush(&self, f: &Resource, deep: bool, monitor: &dyn ProgressMonitor) -> Result<()> {
        while self.batch_lock.is_within_active_thread(f) {
            self.batch_lock.release(monitor)?;
        }
        if deep {
            self.caches.session.purge(f);
        } else {
            self.caches.session.unmark_sync_loaded(f);
            self.caches.session.purge_resource_sync(f);
        }
        info!(folder = %f, deep, "flush complete");
        Ok(())
    }

    pub fn deconfigure(&self, project: &Resource, monitor: &dyn ProgressMonitor) -> Result<()> {
        self.flush(project, true, monitor)?;
        self.caches.phantom.purge(project);
        Ok(())
    }

    pub fn sync_files_changed(&self, folders: &[Resource]) -> Result<()> {
        let mut changed_resources = HashMap::new();
        for folder in folders {
            self.caches.session.unmark_sync_loaded(folder);
            self.caches.session.purge_resource_sync(folder);
            for child in self.list_physical_children(folder)? {
                changed_resources.insert(child.path().to_path_buf(), child);
            }
        }
        let change_set = ChangeSet {
            changed_resources: changed_resources.into_values().collect(),
            changed_folders: folders.to_vec(),
            changed_ignore_files: Vec::new(),
        };
        self.broadcaster.broadcast(&change_set);
        Ok(())
    }

    // -- notify / baserev side maps (no batch scope, op lock only) -----------

    pub fn get_notify_info(&self, r: &Resource) -> Result<Option<NotifyInfo>> {
        let Some(parent) = r.parent() else {
            return Ok(None);
        };
        self.batch_lock.with_op_lock(|| {
            Ok(self
                .disk
                .read_all_notify(&parent)?
                .into_iter()
                .find(|e| e.name == r.name()))
        })
    }

    /// Upserts by name, silently replacing any existing entry for `r`.
    pub fn set_notify_info(&self, r: &Resource, info: Option<NotifyInfo>) -> Result<()> {
        let parent = require_non_root_parent(r)?;
        self.batch_lock.with_op_lock(|| {
            let mut entries = self.disk.read_all_notify(&parent)?;
            entries.retain(|e| e.name != r.name());
            if let Some(info) = info {
                entries.push(info);
            }
            self.disk.write_all_notify(&parent, &entries)
        })
    }

    pub fn delete_notify_info(&self, r: &Resource) -> Result<()> {
        self.set_notify_info(r, None)
    }

    pub fn get_baserev_info(&self, r: &Resource) -> Result<Option<BaserevInfo>> {
        let Some(parent) = r.parent() else {
            return Ok(None);
        };
        self.batch_lock.with_op_lock(|| {
            Ok(self
                .disk
                .read_all_baserev(&parent)?
                .into_iter()
                .find(|e| e.name == r.name()))
        })
    }

    pub fn set_baserev_info(&self, r: &Resource, info: Option<BaserevInfo>) -> Result<()> {
        let parent = require_non_root_parent(r)?;
        self.batch_lock.with_op_lock(|| {
            let mut entries = self.disk.read_all_baserev(&parent)?;
            entries.retain(|e| e.name != r.name());
            if let Some(info) = info {
                entries.push(info);
            }
            self.disk.write_all_baserev(&parent, &entries)
        })
    }

    pub fn delete_baserev_info(&self, r: &Resource) -> Result<()> {
        self.set_baserev_info(r, None)
    }

    pub fn is_edited(&self, file: &Resource) -> bool {
        self.disk.is_edited(file)
    }

    pub fn copy_to_base(&self, file: &Resource) -> Result<()> {
        self.batch_lock.with_op_lock(|| self.disk.copy_to_base(file))
    }

    pub fn restore_from_base(&self, file: &Resource) -> Result<()> {
        self.batch_lock
            .with_op_lock(|| self.disk.restore_from_base(file))
    }

    pub fn delete_base(&self, file: &Resource) -> Result<()> {
        self.batch_lock.with_op_lock(|| self.disk.delete_base(file))
    }
}

fn require_non_root_parent(r: &Resource) -> Result<Resource> {
    let Some(parent) = r.parent() else {
        return Err(SyncError::InvalidScope(format!(
            "{r} has no parent folder"
        )));
    };
    if parent.is_root() {
        return Err(SyncError::InvalidScope(format!(
            "{r}'s parent must not be the workspace root"
        )));
    }
    Ok(parent)
}

/// The flush callback invoked by [`BatchLock`] on outermost release.
/// Steps follow the documented six-step algorithm; per-folder errors
/// are collected rather than aborting the remaining folders.
fn run_flush(
    disk: &Arc<dyn DiskStore>,
    caches: &Caches,
    broadcaster: &Broadcaster,
    root: &std::path::Path,
    change_set: ChangeSet,
) -> Result<()> {
    let exists = |r: &Resource| r.is_root() || root.join(r.path()).exists();
    let mut errors = Vec::new();

    // Step 1: distinct parents of every changed resource.
    let mut dirty_parents: HashMap<PathBuf, Resource> = HashMap::new();
    for r in &change_set.changed_resources {
        if let Some(parent) = r.parent() {
            dirty_parents.insert(parent.path().to_path_buf(), parent);
        }
    }

    // Step 2: folder-sync writes/deletes.
    for folder in &change_set.changed_folders {
        if folder.is_root() || !exists(folder) {
            continue;
        }
        let cache = caches.cache_for(exists(folder));
        match cache.get_folder_sync(folder) {
            None => {
                if !disk.is_linked(folder) {
                    if let Err(e) = disk.delete_folder_sync(folder) {
                        warn!(folder = %folder, error = %e, "failed to delete folder sync");
                        errors.push(FolderCommitError {
                            folder: folder.path().to_path_buf(),
                            message: e.to_string(),
                        });
                        caches.session.purge(folder);
                    }
                }
                dirty_parents.remove(folder.path());
            }
            Some(info) => {
                if disk.is_linked(folder) {
                    continue;
                }
                if let Err(e) = disk.write_folder_sync(folder, &info) {
                    warn!(folder = %folder, error = %e, "failed to write folder sync");
                    errors.push(FolderCommitError {
                        folder: folder.path().to_path_buf(),
                        message: e.to_string(),
                    });
                    caches.session.purge(folder);
                }
            }
        }
    }

    // Step 3: rewrite each dirty parent's Entries file wholesale.
    for folder in dirty_parents.values() {
        if folder.is_root() || !exists(folder) {
            continue;
        }
        if disk.is_linked(folder) {
            continue;
        }
        let cache = caches.cache_for(exists(folder));
        let children = cache.children_sync_bytes(folder);
        let is_static = disk
            .read_all_resource_sync(folder)
            .ok()
            .flatten()
            .map(|(_, is_static)| is_static)
            .unwrap_or(false);
        if let Err(e) = disk.write_all_resource_sync(folder, &children, is_static) {
            warn!(folder = %folder, error = %e, "failed to write resource sync");
            errors.push(FolderCommitError {
                folder: folder.path().to_path_buf(),
                message: e.to_string(),
            });
            cache.unmark_sync_loaded(folder);
            cache.purge_resource_sync(folder);
        }
    }

    // Step 4: parent of each changed ignore file, as a conservative peer set.
    let mut ignore_peers: HashMap<PathBuf, Resource> = HashMap::new();
    for f in &change_set.changed_ignore_files {
        ignore_peers.insert(f.path().to_path_buf(), f.clone());
        if let Some(parent) = f.parent() {
            ignore_peers.insert(parent.path().to_path_buf(), parent);
        }
    }

    // Step 5: broadcast the union.
    let mut union: HashMap<PathBuf, Resource> = HashMap::new();
    for r in change_set
        .changed_resources
        .iter()
        .chain(change_set.changed_folders.iter())
        .chain(dirty_parents.values())
        .chain(ignore_peers.values())
    {
        union.insert(r.path().to_path_buf(), r.clone());
    }
    let broadcast_set = ChangeSet {
        changed_resources: union.into_values().collect(),
        changed_folders: change_set.changed_folders.clone(),
        changed_ignore_files: change_set.changed_ignore_files.clone(),
    };
    broadcaster.broadcast(&broadcast_set);

    info!(
        resources = change_set.changed_resources.len(),
        folders = change_set.changed_folders.len(),
        errors = errors.len(),
        "batch flush complete"
    );

    // Step 6.
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SyncError::CommittingSyncInfoFailed(errors))
    }
}
