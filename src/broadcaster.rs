//! Listener broadcaster (C8): synchronous fan-out of changed resources
//! to registered listeners on the batch-closing thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::RwLock;

use tracing::{error, warn};

use crate::batch::ChangeSet;

/// Receives the union of changed resources/folders/ignore-peers once a
/// batch's flush routine has run.
pub trait SyncChangeListener: Send + Sync {
    fn sync_changed(&self, change_set: &ChangeSet);
}

/// Registry of listeners, fanned out to synchronously and in
/// registration order. A listener panicking is caught and logged so
/// one bad listener can't blow up the flush for the rest.
#[derive(Default)]
pub struct Broadcaster {
    listeners: RwLock<Vec<std::sync::Arc<dyn SyncChangeListener>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Broadcaster {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: std::sync::Arc<dyn SyncChangeListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    pub fn remove_listener(&self, listener: &std::sync::Arc<dyn SyncChangeListener>) {
        self.listeners
            .write()
            .unwrap()
            .retain(|l| !std::sync::Arc::ptr_eq(l, listener));
    }

    /// Broadcast `change_set` to every listener. Always runs every
    /// listener even if an earlier one panics.
    pub fn broadcast(&self, change_set: &ChangeSet) {
        if change_set.changed_resources.is_empty()
            && change_set.changed_folders.is_empty()
            && change_set.changed_ignore_files.is_empty()
        {
            return;
        }
        let listeners = self.listeners.read().unwrap().clone();
        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.sync_changed(change_set)));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "listener panicked".to_string());
                error!(message = %message, "sync change listener panicked; continuing broadcast");
            }
        }
        warn_on_backlog(change_set);
    }
}

fn warn_on_backlog(change_set: &ChangeSet) {
    let total = change_set.changed_resources.len()
        + change_set.changed_folders.len()
        + change_set.changed_ignore_files.len();
    if total > 10_000 {
        warn!(total, "broadcasting an unusually large change set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingListener(Arc<AtomicUsize>);
    impl SyncChangeListener for CountingListener {
        fn sync_changed(&self, _change_set: &ChangeSet) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingListener;
    impl SyncChangeListener for PanickingListener {
        fn sync_changed(&self, _change_set: &ChangeSet) {
            panic!("boom");
        }
    }

    #[test]
    fn broadcast_reaches_every_listener_despite_a_panic() {
        let broadcaster = Broadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));
        broadcaster.add_listener(Arc::new(PanickingListener));
        broadcaster.add_listener(Arc::new(CountingListener(count.clone())));

        let change_set = ChangeSet {
            changed_resources: vec![Resource::file("a/f.txt")],
            changed_folders: vec![],
            changed_ignore_files: vec![],
        };
        broadcaster.broadcast(&change_set);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_change_set_is_not_broadcast() {
        let broadcaster = Broadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));
        broadcaster.add_listener(Arc::new(CountingListener(count.clone())));
        broadcaster.broadcast(&ChangeSet::default());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
