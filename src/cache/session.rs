//! Session cache (C3): sync info for resources that still exist in the
//! workspace.

use crate::cache::{EntryCache, ResourceCache};
use crate::codec::SyncBytes;
use crate::model::{DirtyIndicator, FolderSync, IgnorePatterns};
use crate::resource::Resource;

pub struct SessionCache {
    entries: EntryCache,
}

impl SessionCache {
    pub fn new() -> Self {
        SessionCache {
            entries: EntryCache::new(),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache for SessionCache {
    fn get_sync_bytes(&self, file: &Resource) -> Option<SyncBytes> {
        self.entries.get_sync_bytes(file)
    }

    fn set_sync_bytes(&self, file: &Resource, bytes: SyncBytes) {
        self.entries.set_sync_bytes(file, bytes)
    }

    fn remove_sync_bytes(&self, file: &Resource) -> Option<SyncBytes> {
        self.entries.remove_sync_bytes(file)
    }

    fn get_folder_sync(&self, folder: &Resource) -> Option<FolderSync> {
        self.entries.get_folder_sync(folder)
    }

    fn set_folder_sync(&self, folder: &Resource, info: FolderSync) {
        self.entries.set_folder_sync(folder, info)
    }

    fn remove_folder_sync(&self, folder: &Resource) -> Option<FolderSync> {
        self.entries.remove_folder_sync(folder)
    }

    fn get_ignore_patterns(&self, folder: &Resource) -> Option<IgnorePatterns> {
        self.entries.get_ignore_patterns(folder)
    }

    fn set_ignore_patterns(&self, folder: &Resource, patterns: IgnorePatterns) {
        self.entries.set_ignore_patterns(folder, patterns)
    }

    fn get_dirty_indicator(&self, r: &Resource) -> Option<DirtyIndicator> {
        self.entries.get_dirty_indicator(r)
    }

    fn set_dirty_indicator(&self, r: &Resource, indicator: DirtyIndicator) {
        self.entries.set_dirty_indicator(r, indicator)
    }

    fn flush_dirty(&self, r: &Resource) {
        self.entries.flush_dirty(r)
    }

    fn is_sync_loaded(&self, folder: &Resource) -> bool {
        self.entries.is_sync_loaded(folder)
    }

    fn mark_sync_loaded(&self, folder: &Resource) {
        self.entries.mark_sync_loaded(folder)
    }

    fn unmark_sync_loaded(&self, folder: &Resource) {
        self.entries.unmark_sync_loaded(folder)
    }

    fn purge(&self, r: &Resource) {
        self.entries.purge(r)
    }

    fn purge_resource_sync(&self, file: &Resource) {
        self.entries.purge_resource_sync(file)
    }

    fn dirty_resources(&self) -> Vec<Resource> {
        self.entries.dirty_resources()
    }

    fn children_sync_bytes(&self, folder: &Resource) -> Vec<SyncBytes> {
        self.entries.children_sync_bytes(folder)
    }

    fn loaded_folder_count(&self) -> usize {
        self.entries.loaded_folder_count()
    }
}
