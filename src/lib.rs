//! Thread-safe synchronizer for CVS-family workspace sync metadata:
//! per-resource revision/tag/keyword state, per-folder repository
//! config, ignore lists, and the offline notify/baserev side maps,
//! all cached in memory over an atomic on-disk control directory.
//!
//! [`Synchronizer`] is the single entry point. Construct one per
//! workspace root and share it; every operation is safe to call from
//! any thread.

pub mod batch;
pub mod broadcaster;
pub mod cache;
pub mod codec;
pub mod config;
pub mod disk;
pub mod dirty_propagator;
pub mod error;
pub mod model;
pub mod monitor;
pub mod resource;
pub mod synchronizer;

pub use batch::ChangeSet;
pub use broadcaster::SyncChangeListener;
pub use config::{ControlFileNames, SynchronizerConfig};
pub use error::{FolderCommitError, Result, SyncError};
pub use model::{
    BaserevInfo, DirtyIndicator, FolderSync, IgnorePatterns, ModificationState, NotifyInfo, ResourceSync, Tag, TagKind,
};
pub use monitor::{CancellationFlag, NullMonitor, ProgressMonitor};
pub use resource::{Resource, ResourceKind};
pub use synchronizer::Synchronizer;
