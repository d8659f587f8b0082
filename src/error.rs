use thiserror::Error;

use crate::cli::CliError;
use crate::ledger::LedgerError;
use crate::ops::OpsError;
use crate::repo::RepoError;
use crate::sync::SyncError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred.
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Ops(#[from] OpsError),

    #[error(transparent)]
    Cli(#[from] CliError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Ledger(_) => Transience::Permanent,
            Error::Repo(e) => e.transience(),
            Error::Sync(e) => e.transience(),
            Error::Ops(e) => e.transience(),
            Error::Cli(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // Record encode/decode never touches a working tree.
            Error::Ledger(_) => Effect::None,
            Error::Repo(e) => e.effect(),
            Error::Sync(e) => e.effect(),
            Error::Ops(e) => e.effect(),
            Error::Cli(e) => e.effect(),
        }
    }
}
