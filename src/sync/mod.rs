//! The synchronization engine.
//!
//! An update run walks destination history to recover tracked paths
//! ([`map`]), resolves what each path looks like now on both sides
//! ([`resolve`]), merges upstream changes into the working tree
//! ([`merge`]) and records the new sync point ([`update`]).

pub mod error;
pub mod map;
pub mod merge;
pub mod resolve;
pub mod update;

pub use error::SyncError;
pub use map::{ObjectMap, TrackedPath};
pub use merge::MergeOutcome;
pub use resolve::{HeadState, ResolvedState, Side};
pub use update::{UpdatePhase, UpdateReport};
