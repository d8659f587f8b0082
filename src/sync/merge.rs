//! Three-way content merge of one tracked path into the destination
//! working tree.
//!
//! The merge itself is delegated to git by building three synthetic
//! single-entry trees (ancestor, upstream head, destination head) in
//! the destination object database and merging them. Conflicts are
//! reported, never written: the working tree only ever receives clean
//! merge results.

use std::path::Path;

use git2::{FileFavor, MergeOptions, Repository};
use tracing::{debug, warn};

use crate::repo::{self, Workspace, MODE_EXECUTABLE};

use super::error::SyncError;
use super::map::TrackedPath;

/// What the merger did for one tracked path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to pull, or a local deletion was honored.
    Unchanged,
    /// Clean merge written to the working tree.
    Written { path: String },
    /// Upstream deleted the file and the deletion applied cleanly.
    Removed { path: String },
    /// Overlapping edits; the working tree was left alone.
    Conflict { path: String },
}

/// Applies upstream changes for one resolved record.
///
/// Policy, in order: a destination-side deletion wins outright, an
/// unmodified source has nothing to offer, everything else goes
/// through the merge. A destination that is itself unmodified makes
/// the merge degenerate into taking the upstream content as-is.
pub fn merge_path(ws: &Workspace, rec: &TrackedPath) -> Result<MergeOutcome, SyncError> {
    let Some(dst_head) = &rec.dst_state.head else {
        debug!(path = %rec.dst_path, "deleted at destination; upstream changes dropped");
        return Ok(MergeOutcome::Unchanged);
    };
    if rec.src_state.unmodified() {
        return Ok(MergeOutcome::Unchanged);
    }

    // The ancestor is the destination-side sync blob: it is what both
    // sides have provably diverged from.
    let ancestor = match rec.dst_state.blob {
        Some(oid) => Some((repo::blob_bytes(&ws.dst, oid)?, rec.dst_state.mode)),
        None => None,
    };
    let upstream = match &rec.src_state.head {
        Some(head) => Some((repo::blob_bytes(&ws.src, head.blob)?, head.mode)),
        None => None,
    };
    let local = Some((repo::blob_bytes(&ws.dst, dst_head.blob)?, dst_head.mode));

    let merged = merge_blobs(
        &ws.dst,
        ancestor.as_ref().map(|(b, m)| (b.as_slice(), *m)),
        upstream.as_ref().map(|(b, m)| (b.as_slice(), *m)),
        local.as_ref().map(|(b, m)| (b.as_slice(), *m)),
    )?;

    match merged {
        Merged::Conflict => {
            warn!(path = %dst_head.path, "merge conflict; path left untouched");
            Ok(MergeOutcome::Conflict {
                path: dst_head.path.clone(),
            })
        }
        Merged::Clean(None) => {
            repo::remove_worktree_file(&ws.dst, &dst_head.path)?;
            debug!(path = %dst_head.path, "upstream deletion applied");
            Ok(MergeOutcome::Removed {
                path: dst_head.path.clone(),
            })
        }
        Merged::Clean(Some(bytes)) => {
            repo::write_worktree_file(
                &ws.dst,
                &dst_head.path,
                &bytes,
                dst_head.mode == MODE_EXECUTABLE,
            )?;
            debug!(path = %dst_head.path, bytes = bytes.len(), "merged content written");
            Ok(MergeOutcome::Written {
                path: dst_head.path.clone(),
            })
        }
    }
}

enum Merged {
    Clean(Option<Vec<u8>>),
    Conflict,
}

/// All three trees use the same flat entry name; only content and mode
/// vary per side. An absent side is an empty tree, which lets git's
/// own machinery decide delete-vs-edit cases.
const MERGE_ENTRY: &str = "content";

fn side_tree<'r>(
    repo: &'r Repository,
    side: Option<(&[u8], i32)>,
) -> Result<git2::Tree<'r>, SyncError> {
    let mut builder = repo.treebuilder(None)?;
    if let Some((bytes, mode)) = side {
        let blob = repo.blob(bytes)?;
        builder.insert(MERGE_ENTRY, blob, mode)?;
    }
    let oid = builder.write()?;
    Ok(repo.find_tree(oid)?)
}

fn merge_blobs(
    repo: &Repository,
    ancestor: Option<(&[u8], i32)>,
    upstream: Option<(&[u8], i32)>,
    local: Option<(&[u8], i32)>,
) -> Result<Merged, SyncError> {
    let ancestor_tree = side_tree(repo, ancestor)?;
    let upstream_tree = side_tree(repo, upstream)?;
    let local_tree = side_tree(repo, local)?;

    let mut opts = MergeOptions::new();
    opts.file_favor(FileFavor::Normal);
    let index = repo.merge_trees(&ancestor_tree, &upstream_tree, &local_tree, Some(&opts))?;

    if index.has_conflicts() {
        return Ok(Merged::Conflict);
    }
    match index.get_path(Path::new(MERGE_ENTRY), 0) {
        Some(entry) => Ok(Merged::Clean(Some(
            repo.find_blob(entry.id)?.content().to_vec(),
        ))),
        None => Ok(Merged::Clean(None)),
    }
}
