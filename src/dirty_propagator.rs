//! Dirty propagator (C5): maintains the tri-state dirty indicator per
//! resource and lazily propagates changes up to ancestors.

use tracing::debug;

use crate::cache::Caches;
use crate::model::{DirtyIndicator, ModificationState};
use crate::resource::Resource;

/// `adjust(resource, new)`: writes `new` to the resource's cache entry
/// and ascends, collapsing to `RECOMPUTE` on the way up for anything
/// but a dirtying transition. Terminates as soon as a resource's
/// indicator is already what we're about to write, so a clean subtree
/// never re-walks its ancestors.
pub fn adjust(caches: &Caches, exists: impl Fn(&Resource) -> bool, resource: &Resource, new: DirtyIndicator) {
    if resource.is_root() {
        return;
    }
    let cache = caches.cache_for(exists(resource));
    let current = cache.get_dirty_indicator(resource);
    if current == Some(new) {
        return;
    }
    cache.set_dirty_indicator(resource, new);
    debug!(resource = %resource, ?new, "dirty indicator adjusted");

    let Some(parent) = resource.parent() else {
        return;
    };
    let ancestor_indicator = match new {
        DirtyIndicator::IsDirty => DirtyIndicator::IsDirty,
        DirtyIndicator::NotDirty | DirtyIndicator::Recompute => DirtyIndicator::Recompute,
    };
    adjust(caches, exists, &parent, ancestor_indicator);
}

/// Maps a resource's raw indicator to the state a caller observes.
/// Absence (never set) and `RECOMPUTE` both mean `Unknown`: the caller
/// is expected to recompute by inspecting children.
pub fn get_modification_state(
    caches: &Caches,
    exists: impl Fn(&Resource) -> bool,
    r: &Resource,
) -> ModificationState {
    let cache = caches.cache_for(exists(r));
    match cache.get_dirty_indicator(r) {
        Some(DirtyIndicator::IsDirty) => ModificationState::Dirty,
        Some(DirtyIndicator::NotDirty) => ModificationState::Clean,
        Some(DirtyIndicator::Recompute) | None => ModificationState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirtying_a_file_propagates_dirty_to_ancestors() {
        let caches = Caches::new();
        let file = Resource::file("proj/sub/f.txt");
        adjust(&caches, |_| true, &file, DirtyIndicator::IsDirty);

        let folder = Resource::folder("proj/sub");
        let project = Resource::project("proj");
        assert_eq!(
            get_modification_state(&caches, |_| true, &folder),
            ModificationState::Dirty
        );
        assert_eq!(
            get_modification_state(&caches, |_| true, &project),
            ModificationState::Dirty
        );
    }

    #[test]
    fn clearing_dirty_leaves_ancestor_unknown_until_recomputed() {
        let caches = Caches::new();
        let file = Resource::file("proj/f.txt");
        adjust(&caches, |_| true, &file, DirtyIndicator::IsDirty);
        adjust(&caches, |_| true, &file, DirtyIndicator::NotDirty);

        let project = Resource::project("proj");
        assert_eq!(
            get_modification_state(&caches, |_| true, &project),
            ModificationState::Unknown
        );
    }

    #[test]
    fn root_is_never_written() {
        let caches = Caches::new();
        let root = Resource::workspace_root();
        adjust(&caches, |_| true, &root, DirtyIndicator::IsDirty);
        assert_eq!(
            get_modification_state(&caches, |_| true, &root),
            ModificationState::Unknown
        );
    }
}
