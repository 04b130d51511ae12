//! The synchronizer's data model: sync records, folder config, ignore
//! lists, notify/baserev side maps, and the dirty indicator.

pub mod baserev;
pub mod dirty;
pub mod folder_sync;
pub mod ignore;
pub mod notify;
pub mod resource_sync;
pub mod tag;

pub use baserev::BaserevInfo;
pub use dirty::{DirtyIndicator, ModificationState};
pub use folder_sync::FolderSync;
pub use ignore::IgnorePatterns;
pub use notify::NotifyInfo;
pub use resource_sync::{KeywordMode, ResourceSync};
pub use tag::{Tag, TagKind};
