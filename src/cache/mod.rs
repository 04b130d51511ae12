//! In-memory caches (C3 session / C4 phantom) sitting in front of the
//! disk store. Both caches expose the identical [`ResourceCache`]
//! interface; which one backs a given resource is a routing decision
//! made by the synchronizer (see [`Caches::cache_for`]), not something
//! either cache decides for itself.

pub mod phantom;
pub mod session;

use std::path::PathBuf;

use dashmap::DashMap;

pub use phantom::PhantomCache;
pub use session::SessionCache;

use crate::codec::SyncBytes;
use crate::model::{DirtyIndicator, FolderSync, IgnorePatterns};
use crate::resource::Resource;

/// Shared read/write surface of the session and phantom caches.
pub trait ResourceCache: Send + Sync {
    fn get_sync_bytes(&self, file: &Resource) -> Option<SyncBytes>;
    fn set_sync_bytes(&self, file: &Resource, bytes: SyncBytes);
    fn remove_sync_bytes(&self, file: &Resource) -> Option<SyncBytes>;

    fn get_folder_sync(&self, folder: &Resource) -> Option<FolderSync>;
    fn set_folder_sync(&self, folder: &Resource, info: FolderSync);
    fn remove_folder_sync(&self, folder: &Resource) -> Option<FolderSync>;

    fn get_ignore_patterns(&self, folder: &Resource) -> Option<IgnorePatterns>;
    fn set_ignore_patterns(&self, folder: &Resource, patterns: IgnorePatterns);

    fn get_dirty_indicator(&self, r: &Resource) -> Option<DirtyIndicator>;
    fn set_dirty_indicator(&self, r: &Resource, indicator: DirtyIndicator);
    /// Drop a resource's dirty marker outright, e.g. because the
    /// resource itself was just deleted and has nothing left to track.
    fn flush_dirty(&self, r: &Resource);

    fn is_sync_loaded(&self, folder: &Resource) -> bool;
    fn mark_sync_loaded(&self, folder: &Resource);
    fn unmark_sync_loaded(&self, folder: &Resource);

    /// Remove every cached entry at or under `r`.
    fn purge(&self, r: &Resource);
    /// Remove just the cached sync bytes for one file, leaving sibling
    /// state (dirty marker, folder sync) untouched.
    fn purge_resource_sync(&self, file: &Resource);

    /// Resources currently carrying a dirty marker, for the flush
    /// routine to drain. Order is unspecified.
    fn dirty_resources(&self) -> Vec<Resource>;

    /// Direct children of `folder` currently holding cached sync
    /// bytes, ordered by path for deterministic Entries rewrites.
    fn children_sync_bytes(&self, folder: &Resource) -> Vec<SyncBytes>;

    /// Number of folders currently marked loaded, for the configured
    /// soft-cap check.
    fn loaded_folder_count(&self) -> usize;
}

/// Shared storage behind both [`SessionCache`] and [`PhantomCache`]. Not
/// exposed directly; each wrapper provides a distinct type so callers
/// can't accidentally mix the two up at a call site.
pub(crate) struct EntryCache {
    sync_bytes: DashMap<PathBuf, SyncBytes>,
    folder_sync: DashMap<PathBuf, FolderSync>,
    ignore: DashMap<PathBuf, IgnorePatterns>,
    dirty: DashMap<PathBuf, (Resource, DirtyIndicator)>,
    loaded: DashMap<PathBuf, ()>,
}

impl EntryCache {
    pub(crate) fn new() -> Self {
        EntryCache {
            sync_bytes: DashMap::new(),
            folder_sync: DashMap::new(),
            ignore: DashMap::new(),
            dirty: DashMap::new(),
            loaded: DashMap::new(),
        }
    }

    pub(crate) fn get_sync_bytes(&self, file: &Resource) -> Option<SyncBytes> {
        self.sync_bytes.get(file.path()).map(|e| e.value().clone())
    }

    pub(crate) fn set_sync_bytes(&self, file: &Resource, bytes: SyncBytes) {
        self.sync_bytes.insert(file.path().to_path_buf(), bytes);
    }

    pub(crate) fn remove_sync_bytes(&self, file: &Resource) -> Option<SyncBytes> {
        self.sync_bytes.remove(file.path()).map(|(_, v)| v)
    }

    pub(crate) fn get_folder_sync(&self, folder: &Resource) -> Option<FolderSync> {
        self.folder_sync
            .get(folder.path())
            .map(|e| e.value().clone())
    }

    pub(crate) fn set_folder_sync(&self, folder: &Resource, info: FolderSync) {
        self.folder_sync.insert(folder.path().to_path_buf(), info);
    }

    pub(crate) fn remove_folder_sync(&self, folder: &Resource) -> Option<FolderSync> {
        self.folder_sync.remove(folder.path()).map(|(_, v)| v)
    }

    pub(crate) fn get_ignore_patterns(&self, folder: &Resource) -> Option<IgnorePatterns> {
        self.ignore.get(folder.path()).map(|e| e.value().clone())
    }

    pub(crate) fn set_ignore_patterns(&self, folder: &Resource, patterns: IgnorePatterns) {
        self.ignore.insert(folder.path().to_path_buf(), patterns);
    }

    pub(crate) fn get_dirty_indicator(&self, r: &Resource) -> Option<DirtyIndicator> {
        self.dirty.get(r.path()).map(|e| e.value().1)
    }

    pub(crate) fn set_dirty_indicator(&self, r: &Resource, indicator: DirtyIndicator) {
        self.dirty
            .insert(r.path().to_path_buf(), (r.clone(), indicator));
    }

    pub(crate) fn flush_dirty(&self, r: &Resource) {
        self.dirty.remove(r.path());
    }

    pub(crate) fn is_sync_loaded(&self, folder: &Resource) -> bool {
        self.loaded.contains_key(folder.path())
    }

    pub(crate) fn mark_sync_loaded(&self, folder: &Resource) {
        self.loaded.insert(folder.path().to_path_buf(), ());
    }

    pub(crate) fn unmark_sync_loaded(&self, folder: &Resource) {
        self.loaded.remove(folder.path());
    }

    pub(crate) fn purge(&self, r: &Resource) {
        let prefix = r.path().to_path_buf();
        let under = |p: &PathBuf| p == &prefix || p.starts_with(&prefix);
        self.sync_bytes.retain(|k, _| !under(k));
        self.folder_sync.retain(|k, _| !under(k));
        self.ignore.retain(|k, _| !under(k));
        self.dirty.retain(|k, _| !under(k));
        self.loaded.retain(|k, _| !under(k));
    }

    pub(crate) fn purge_resource_sync(&self, file: &Resource) {
        self.sync_bytes.remove(file.path());
    }

    pub(crate) fn dirty_resources(&self) -> Vec<Resource> {
        self.dirty.iter().map(|e| e.value().0.clone()).collect()
    }

    pub(crate) fn children_sync_bytes(&self, folder: &Resource) -> Vec<SyncBytes> {
        let parent = folder.path();
        let mut items: Vec<(PathBuf, SyncBytes)> = self
            .sync_bytes
            .iter()
            .filter(|e| e.key().parent() == Some(parent))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(_, v)| v).collect()
    }

    pub(crate) fn loaded_folder_count(&self) -> usize {
        self.loaded.len()
    }
}

/// The pair of caches the synchronizer routes resources through.
pub struct Caches {
    pub session: SessionCache,
    pub phantom: PhantomCache,
}

impl Caches {
    pub fn new() -> Self {
        Caches {
            session: SessionCache::new(),
            phantom: PhantomCache::new(),
        }
    }

    /// Route to the session cache if `exists` (the resource is still
    /// present in the workspace), otherwise the phantom cache.
    pub fn cache_for(&self, exists: bool) -> &dyn ResourceCache {
        if exists {
            &self.session
        } else {
            &self.phantom
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}
