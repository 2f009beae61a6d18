// ABOUTME: Blue/green slot bookkeeping: the persisted active pointer, swaps, pre-swap backups.
// ABOUTME: The pointer is read once at startup and written only by finalize_swap.

mod backup;
mod manager;
mod store;

pub use backup::{BackupInfo, BackupSpec, create_backup};
pub use manager::{PendingSwap, SlotManager};
pub use store::SlotStore;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} holds {content:?}, which is not a slot identity")]
    Corrupt { path: PathBuf, content: String },

    #[error("pre-swap backup {path} failed: {reason}")]
    Backup { path: PathBuf, reason: String },
}

impl SlotError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SlotError::Io {
            action,
            path,
            source,
        }
    }
}
