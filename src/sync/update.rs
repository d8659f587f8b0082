//! Drives one update run: map, resolve both sides, merge each path,
//! and record the new sync point.

use std::path::Path;

use git2::{Commit, Oid};
use serde::Serialize;
use tracing::{debug, info};

use crate::ledger::{ProvenanceRecord, RecordEntries};
use crate::repo::{self, Workspace};

use super::error::SyncError;
use super::map;
use super::merge::{self, MergeOutcome};
use super::resolve::{self, Side};

/// Pipeline phases, in execution order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdatePhase {
    MapObjects,
    ResolveSrc,
    ResolveDst,
    MergeEach,
    Done,
    Failed,
}

/// What one update run did, path by path.
#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    /// Paths whose merged content was written.
    pub merged: Vec<String>,
    /// Paths removed because upstream deleted them.
    pub removed: Vec<String>,
    /// Paths with overlapping edits, left untouched.
    pub conflicts: Vec<String>,
    /// Paths already up to date or settled by a local deletion.
    pub unchanged: usize,
    /// Paths dropped because one side could not be resolved.
    pub skipped: usize,
    /// The sync commit, when one was created.
    pub commit: Option<String>,
}

impl UpdateReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Runs a full update against a clean destination working tree.
///
/// Conflicting paths do not abort the run: every other path is still
/// merged, but a run with any conflict ends without a sync commit so
/// the operator resolves and commits by hand.
pub fn run(ws: &Workspace) -> Result<UpdateReport, SyncError> {
    let result = run_phases(ws);
    if let Err(err) = &result {
        debug!(phase = ?UpdatePhase::Failed, error = %err, "update aborted");
    }
    result
}

fn run_phases(ws: &Workspace) -> Result<UpdateReport, SyncError> {
    repo::ensure_clean(&ws.dst)?;
    let src_head = repo::require_head_commit(&ws.src)?;

    debug!(phase = ?UpdatePhase::MapObjects, "update phase");
    let mut map = map::build(&ws.dst)?;
    if map.is_empty() {
        info!("nothing tracked; nothing to update");
        return Ok(UpdateReport::default());
    }
    // A non-empty map implies the destination has commits.
    let dst_head = repo::require_head_commit(&ws.dst)?;

    debug!(phase = ?UpdatePhase::ResolveSrc, "update phase");
    resolve::resolve(&ws.src, Side::Source, &mut map, &src_head)?;
    debug!(phase = ?UpdatePhase::ResolveDst, "update phase");
    resolve::resolve(&ws.dst, Side::Destination, &mut map, &dst_head)?;

    debug!(phase = ?UpdatePhase::MergeEach, paths = map.len(), "update phase");
    let mut report = UpdateReport::default();
    // Current src:dst pairs for the sync record, written paths only.
    let mut synced: Vec<(String, String)> = Vec::new();
    let mut removals: Vec<String> = Vec::new();
    for rec in map.records() {
        if rec.skipped {
            report.skipped += 1;
            continue;
        }
        match merge::merge_path(ws, rec)? {
            MergeOutcome::Unchanged => report.unchanged += 1,
            MergeOutcome::Written { path } => {
                let src_now = rec
                    .src_state
                    .head
                    .as_ref()
                    .map(|h| h.path.clone())
                    .unwrap_or_else(|| rec.src_path.clone());
                synced.push((src_now, path.clone()));
                report.merged.push(path);
            }
            MergeOutcome::Removed { path } => {
                removals.push(path.clone());
                report.removed.push(path);
            }
            MergeOutcome::Conflict { path } => report.conflicts.push(path),
        }
    }

    if report.has_conflicts() {
        info!(
            conflicts = report.conflicts.len(),
            merged = report.merged.len(),
            "conflicts present; no sync commit created"
        );
        return Ok(report);
    }
    if report.merged.is_empty() && removals.is_empty() {
        info!(unchanged = report.unchanged, "all tracked paths up to date");
        return Ok(report);
    }

    let commit = commit_sync(ws, &dst_head, src_head.id(), synced, &removals)?;
    report.commit = commit.map(|oid| oid.to_string());
    debug!(phase = ?UpdatePhase::Done, "update phase");
    Ok(report)
}

/// Stages merge results and commits them under a fresh sync record.
///
/// The record names the paths written this run at their current
/// locations on both sides; removed paths drop out of the record and
/// with it out of future maps.
fn commit_sync(
    ws: &Workspace,
    dst_head: &Commit<'_>,
    upstream: Oid,
    synced: Vec<(String, String)>,
    removals: &[String],
) -> Result<Option<Oid>, SyncError> {
    let mut index = ws.dst.index()?;
    for (_, path) in &synced {
        index.add_path(Path::new(path))?;
    }
    for path in removals {
        index.remove_path(Path::new(path))?;
    }
    index.write()?;

    let tree_oid = index.write_tree()?;
    if tree_oid == dst_head.tree_id() {
        // Both sides converged on identical content.
        debug!("merge results match the current tree; no sync commit needed");
        return Ok(None);
    }
    let tree = ws.dst.find_tree(tree_oid)?;

    let files = synced.len();
    let record = ProvenanceRecord::new(
        repo::remotes(&ws.src)?,
        upstream,
        RecordEntries::Files(synced),
    );
    let sig = repo::signature(&ws.dst)?;
    let oid = ws.dst.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &record.encode(),
        &tree,
        &[dst_head],
    )?;
    info!(commit = %oid, files, removed = removals.len(), "sync commit created");
    Ok(Some(oid))
}
