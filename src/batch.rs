//! Reentrant per-thread batch lock (C6).
//!
//! Lock order is `workspace ⊐ batch ⊐ op`: a thread acquires the
//! workspace-wide scheduling rule once per outermost batch, the batch
//! scope (this module's thread-local accumulator) lives entirely
//! within that, and individual cache mutations additionally take the
//! short-lived `op_lock` inside it. No crate in this lineage models
//! Eclipse-style nested scheduling rules, so this is hand-rolled on
//! top of `std::sync::{Mutex, Condvar}` and a thread-local stack depth.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use tracing::{debug, trace};

use crate::error::{Result, SyncError};
use crate::monitor::ProgressMonitor;
use crate::resource::Resource;

pub type FlushCallback = Box<dyn FnOnce(ChangeSet, &dyn ProgressMonitor) -> Result<()> + Send>;

/// Everything recorded against a batch between `acquire` and the
/// outermost `release`.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
    pub changed_resources: Vec<Resource>,
    pub changed_folders: Vec<Resource>,
    pub changed_ignore_files: Vec<Resource>,
}

#[derive(Default)]
struct Accumulator {
    changed_resources: HashMap<PathBuf, Resource>,
    changed_folders: HashMap<PathBuf, Resource>,
    changed_ignore_files: HashMap<PathBuf, Resource>,
}

impl Accumulator {
    fn into_change_set(self) -> ChangeSet {
        ChangeSet {
            changed_resources: self.changed_resources.into_values().collect(),
            changed_folders: self.changed_folders.into_values().collect(),
            changed_ignore_files: self.changed_ignore_files.into_values().collect(),
        }
    }
}

struct ThreadBatchState {
    /// The resource passed to the outermost `acquire` on this thread;
    /// every nested acquire's resource must be contained in it.
    rule: Resource,
    flush_callback: FlushCallback,
    accumulator: Accumulator,
}

thread_local! {
    static SCOPE: RefCell<Option<ThreadBatchState>> = const { RefCell::new(None) };
}

struct LockState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// The workspace-scheduling-rule lock plus the op lock nested inside it.
pub struct BatchLock {
    workspace: Mutex<LockState>,
    cond: std::sync::Condvar,
    op_lock: Mutex<()>,
}

impl BatchLock {
    pub fn new() -> Self {
        BatchLock {
            workspace: Mutex::new(LockState {
                owner: None,
                depth: 0,
            }),
            cond: std::sync::Condvar::new(),
            op_lock: Mutex::new(()),
        }
    }

    fn acquire_workspace(&self) {
        let mut state = self.workspace.lock().unwrap();
        let me = thread::current().id();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    return;
                }
                Some(owner) if owner == me => {
                    state.depth += 1;
                    return;
                }
                Some(_) => {
                    state = self.cond.wait(state).unwrap();
                }
            }
        }
    }

    /// Decrements the workspace lock's depth. Returns `true` if this
    /// was the outermost release (depth reached zero).
    fn release_workspace(&self) -> bool {
        let mut state = self.workspace.lock().unwrap();
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.cond.notify_all();
            true
        } else {
            false
        }
    }

    /// Begin (or nest into) a batch scoped to `resource`. On a thread
    /// with no active batch this blocks until the workspace rule is
    /// free, then establishes `resource` as the thread's top rule and
    /// captures `flush_callback` for the eventual outermost release.
    ///
    /// On a thread already inside a batch, `resource` must be
    /// contained in the active rule (itself or a descendant); the
    /// supplied `flush_callback` is discarded since only the
    /// outermost acquire's callback ever runs.
    pub fn acquire(&self, resource: &Resource, flush_callback: FlushCallback) -> Result<()> {
        let already_active = SCOPE.with(|cell| -> Result<bool> {
            match cell.borrow().as_ref() {
                None => Ok(false),
                Some(existing) => {
                    if resource.path() == existing.rule.path()
                        || resource.path().starts_with(existing.rule.path())
                    {
                        Ok(true)
                    } else {
                        Err(SyncError::InvalidScope(format!(
                            "{resource} is not contained in the active batch rule {}",
                            existing.rule
                        )))
                    }
                }
            }
        })?;

        self.acquire_workspace();

        if !already_active {
            SCOPE.with(|cell| {
                *cell.borrow_mut() = Some(ThreadBatchState {
                    rule: resource.clone(),
                    flush_callback,
                    accumulator: Accumulator::default(),
                });
            });
            trace!(resource = %resource, "batch opened");
        }
        Ok(())
    }

    /// Pop one level of nesting. Only the release that brings the
    /// workspace lock's depth to zero drains the accumulated change
    /// set and invokes the registered flush callback.
    pub fn release(&self, monitor: &dyn ProgressMonitor) -> Result<()> {
        let is_outermost = self.release_workspace();
        if !is_outermost {
            return Ok(());
        }
        let finished = SCOPE.with(|cell| cell.borrow_mut().take());
        let Some(finished) = finished else {
            return Err(SyncError::InvalidScope(
                "release called without a matching acquire".to_string(),
            ));
        };
        debug!(rule = %finished.rule, "batch closed, flushing");
        let change_set = finished.accumulator.into_change_set();
        (finished.flush_callback)(change_set, monitor)
    }

    pub fn record_resource_changed(&self, r: &Resource) {
        SCOPE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                state
                    .accumulator
                    .changed_resources
                    .insert(r.path().to_path_buf(), r.clone());
            }
        });
    }

    pub fn record_folder_changed(&self, f: &Resource) {
        SCOPE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                state
                    .accumulator
                    .changed_folders
                    .insert(f.path().to_path_buf(), f.clone());
            }
        });
    }

    pub fn record_ignore_file_change(&self, f: &Resource) {
        SCOPE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                state
                    .accumulator
                    .changed_ignore_files
                    .insert(f.path().to_path_buf(), f.clone());
            }
        });
    }

    /// Whether `r` falls within the calling thread's active batch
    /// rule. `false` if the thread has no active batch.
    pub fn is_within_active_thread(&self, r: &Resource) -> bool {
        SCOPE.with(|cell| {
            cell.borrow().as_ref().is_some_and(|s| {
                r.path() == s.rule.path() || r.path().starts_with(s.rule.path())
            })
        })
    }

    /// Run `f` while holding the op lock, nested inside the workspace
    /// lock. Every cache mutation must go through this.
    pub fn with_op_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard: MutexGuard<'_, ()> = self.op_lock.lock().unwrap();
        f()
    }
}

impl Default for BatchLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::NullMonitor;

    #[test]
    fn nested_acquire_within_rule_does_not_flush_until_outermost_release() {
        let lock = BatchLock::new();
        let flushed = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let flushed2 = flushed.clone();

        lock.acquire(
            &Resource::project("proj"),
            Box::new(move |_changes, _m| {
                flushed2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();
        lock.acquire(&Resource::file("proj/f.txt"), Box::new(|_, _| Ok(())))
            .unwrap();

        lock.release(&NullMonitor).unwrap();
        assert_eq!(flushed.load(std::sync::atomic::Ordering::SeqCst), 0);

        lock.release(&NullMonitor).unwrap();
        assert_eq!(flushed.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn acquire_outside_rule_is_rejected() {
        let lock = BatchLock::new();
        lock.acquire(&Resource::project("a"), Box::new(|_, _| Ok(())))
            .unwrap();
        let err = lock
            .acquire(&Resource::project("b"), Box::new(|_, _| Ok(())))
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidScope(_)));
        lock.release(&NullMonitor).unwrap();
    }

    #[test]
    fn change_set_is_drained_on_outermost_release() {
        let lock = BatchLock::new();
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));
        let captured2 = captured.clone();

        lock.acquire(
            &Resource::project("proj"),
            Box::new(move |changes, _m| {
                *captured2.lock().unwrap() = Some(changes);
                Ok(())
            }),
        )
        .unwrap();
        lock.record_resource_changed(&Resource::file("proj/f.txt"));
        lock.record_folder_changed(&Resource::project("proj"));
        lock.release(&NullMonitor).unwrap();

        let changes = captured.lock().unwrap().take().unwrap();
        assert_eq!(changes.changed_resources.len(), 1);
        assert_eq!(changes.changed_folders.len(), 1);
    }
}
