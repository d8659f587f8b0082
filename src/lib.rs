#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod ops;
mod paths;
pub mod repo;
pub mod sync;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the types most callers need at the crate root.
pub use crate::ledger::{ProvenanceRecord, RecordEntries, RemoteSpec};
pub use crate::repo::Workspace;
pub use crate::sync::{ObjectMap, TrackedPath, UpdateReport};
