use git2::Oid;
use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::ledger::LedgerError;
use crate::repo::RepoError;

/// Failures across the update pipeline, from history walk to merge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// A commit carried the sync sentinel but its record is broken.
    /// The map cannot be trusted past this point, so the walk aborts.
    #[error("malformed sync record in commit {commit}: {source}")]
    MalformedLedger {
        commit: Oid,
        #[source]
        source: LedgerError,
    },
    #[error("rename records form a cycle starting at {0:?}")]
    RenameCycle(String),
    #[error("rename {old:?} -> {new:?} does not end at a tracked path")]
    OrphanRename { old: String, new: String },
    #[error("unsupported change kind {kind:?} for tracked path {path:?}")]
    UnsupportedDelta { path: String, kind: git2::Delta },
    #[error("{0} path(s) conflicted; resolve by hand and commit")]
    Conflicts(usize),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl SyncError {
    /// Whether retrying without operator intervention could help.
    pub fn transience(&self) -> Transience {
        match self {
            SyncError::MalformedLedger { .. }
            | SyncError::RenameCycle(_)
            | SyncError::OrphanRename { .. }
            | SyncError::UnsupportedDelta { .. }
            | SyncError::Conflicts(_) => Transience::Permanent,
            SyncError::Repo(err) => err.transience(),
            SyncError::Git(_) => Transience::Unknown,
        }
    }

    /// Whether the destination working tree may have been touched.
    pub fn effect(&self) -> Effect {
        match self {
            // Map building and resolution happen before any write.
            SyncError::MalformedLedger { .. }
            | SyncError::RenameCycle(_)
            | SyncError::OrphanRename { .. }
            | SyncError::UnsupportedDelta { .. } => Effect::None,
            // Clean merges are written before conflicts are reported.
            SyncError::Conflicts(_) => Effect::Some,
            SyncError::Repo(err) => err.effect(),
            SyncError::Git(_) => Effect::Unknown,
        }
    }
}
