//! Operator-facing repository operations: track, rename, status.

pub mod object;
pub mod rename;
pub mod status;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::repo::RepoError;
use crate::sync::SyncError;

pub use object::TrackOutcome;
pub use status::{PathStatus, StatusReport};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsError {
    #[error("source object {0} does not exist")]
    SourceMissing(PathBuf),
    #[error("path {0:?} is not tracked")]
    NotTracked(String),
    #[error("rename target {0:?} already exists")]
    TargetExists(String),
    #[error("path {0} is not valid unicode")]
    NonUnicodePath(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl OpsError {
    pub fn transience(&self) -> Transience {
        match self {
            OpsError::SourceMissing(_)
            | OpsError::NotTracked(_)
            | OpsError::TargetExists(_)
            | OpsError::NonUnicodePath(_) => Transience::Permanent,
            OpsError::Io { .. } | OpsError::Git(_) => Transience::Unknown,
            OpsError::Sync(err) => err.transience(),
            OpsError::Repo(err) => err.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // Validation failures happen before any file is touched.
            OpsError::SourceMissing(_)
            | OpsError::NotTracked(_)
            | OpsError::TargetExists(_)
            | OpsError::NonUnicodePath(_) => Effect::None,
            OpsError::Io { .. } | OpsError::Git(_) => Effect::Unknown,
            OpsError::Sync(err) => err.effect(),
            OpsError::Repo(err) => err.effect(),
        }
    }
}
