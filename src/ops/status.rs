//! Reports every tracked path and how it stands against the working
//! tree.

use std::collections::HashSet;

use git2::{Repository, StatusOptions};
use serde::Serialize;

use crate::sync;

use super::OpsError;

#[derive(Debug, Serialize)]
pub struct PathStatus {
    /// Current destination path.
    pub path: String,
    /// Source path as of the last sync.
    pub source: String,
    /// Upstream commit the content was last taken from.
    pub source_commit: String,
    /// Destination commit that recorded the sync.
    pub synced_commit: String,
    /// The working copy differs from the destination head.
    pub dirty: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub tracked: Vec<PathStatus>,
}

pub fn run(dst: &Repository) -> Result<StatusReport, OpsError> {
    let map = sync::map::build(dst)?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .include_ignored(false)
        .recurse_untracked_dirs(true);
    let statuses = dst.statuses(Some(&mut opts))?;
    let dirty: HashSet<String> = statuses
        .iter()
        .filter_map(|entry| entry.path().map(str::to_string))
        .collect();

    let mut tracked: Vec<PathStatus> = map
        .records()
        .iter()
        .map(|rec| PathStatus {
            path: rec.dst_path.clone(),
            source: rec.src_path.clone(),
            source_commit: rec.src_commit.to_string(),
            synced_commit: rec.dst_commit.to_string(),
            dirty: dirty.contains(&rec.dst_path),
        })
        .collect();
    tracked.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(StatusReport { tracked })
}
