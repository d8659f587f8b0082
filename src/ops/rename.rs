//! Moves a tracked file within the destination repository.
//!
//! The move is recorded as a rename entry so later runs can follow the
//! file to its new name when rebuilding the map.

use std::fs;

use git2::Oid;
use tracing::info;

use crate::ledger::{ProvenanceRecord, RecordEntries};
use crate::repo::{self, Workspace};
use crate::sync;

use super::OpsError;

pub fn run(ws: &Workspace, old: &str, new: &str) -> Result<Oid, OpsError> {
    repo::ensure_clean(&ws.dst)?;

    let map = sync::map::build(&ws.dst)?;
    if map.index_of_dst(old).is_none() {
        return Err(OpsError::NotTracked(old.to_string()));
    }
    if map.index_of_dst(new).is_some() {
        return Err(OpsError::TargetExists(new.to_string()));
    }

    // The record needs the upstream position even though no content
    // moves between repositories.
    let src_head = repo::require_head_commit(&ws.src)?;
    let dst_head = repo::require_head_commit(&ws.dst)?;

    let from = repo::worktree_path(&ws.dst, old)?;
    let to = repo::worktree_path(&ws.dst, new)?;
    if to.exists() {
        return Err(OpsError::TargetExists(new.to_string()));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| OpsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::rename(&from, &to).map_err(|source| OpsError::Io { path: from, source })?;

    let mut index = ws.dst.index()?;
    index.remove_path(std::path::Path::new(old))?;
    index.add_path(std::path::Path::new(new))?;
    index.write()?;
    let tree = ws.dst.find_tree(index.write_tree()?)?;

    let record = ProvenanceRecord::new(
        repo::remotes(&ws.src)?,
        src_head.id(),
        RecordEntries::Rename {
            old: old.to_string(),
            new: new.to_string(),
        },
    );
    let sig = repo::signature(&ws.dst)?;
    let oid = ws.dst.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &record.encode(),
        &tree,
        &[&dst_head],
    )?;
    info!(commit = %oid, old, new, "renamed");
    Ok(oid)
}
