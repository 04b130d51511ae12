use std::path::PathBuf;

use thiserror::Error;

/// Errors produced anywhere in the synchronizer stack.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("malformed sync record at offset {offset}: {reason}")]
    MalformedSyncRecord { offset: usize, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workspace is locked by another operation in progress")]
    WorkspaceLocked,

    #[error("invalid batch scope: {0}")]
    InvalidScope(String),

    #[error("folder {} is linked and cannot be written to", .0.display())]
    LinkedFolderNotWritable(PathBuf),

    #[error("committing sync info failed for {} folder(s)", .0.len())]
    CommittingSyncInfoFailed(Vec<FolderCommitError>),

    #[error("operation cancelled")]
    Cancelled,
}

/// One folder's worth of flush failure, collected into a multi-status.
#[derive(Debug, Clone)]
pub struct FolderCommitError {
    pub folder: PathBuf,
    pub message: String,
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
