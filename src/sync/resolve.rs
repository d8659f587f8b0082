//! Resolves what each tracked path looks like *now* on one side.
//!
//! For every sync point the map recorded, one diff from the sync tree
//! to the side's head answers the question for all paths sharing that
//! sync commit. A path without a matching delta keeps its seeded
//! state, which already means "unchanged since the sync".

use std::collections::HashMap;
use std::path::Path;

use git2::{Commit, Delta, DiffFindOptions, DiffOptions, Oid, Repository};
use tracing::{debug, warn};

use crate::repo;

use super::error::SyncError;
use super::map::{ObjectMap, TrackedPath};

/// Which repository a resolution pass runs against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    fn sync_commit(self, rec: &TrackedPath) -> Oid {
        match self {
            Side::Source => rec.src_commit,
            Side::Destination => rec.dst_commit,
        }
    }

    fn sync_path(self, rec: &TrackedPath) -> &str {
        match self {
            Side::Source => &rec.src_path,
            Side::Destination => &rec.dst_path_at_sync,
        }
    }

    fn state(self, rec: &TrackedPath) -> &ResolvedState {
        match self {
            Side::Source => &rec.src_state,
            Side::Destination => &rec.dst_state,
        }
    }

    fn state_mut(self, rec: &mut TrackedPath) -> &mut ResolvedState {
        match self {
            Side::Source => &mut rec.src_state,
            Side::Destination => &mut rec.dst_state,
        }
    }
}

/// Content identity of one tracked path on one side.
#[derive(Debug, Clone, Default)]
pub struct ResolvedState {
    /// Tree entry mode at the sync point.
    pub mode: i32,
    /// Blob at the sync point; the merge ancestor. `None` when the
    /// path was absent from its own sync tree.
    pub blob: Option<Oid>,
    /// Where the content sits at the side's head. `None` means the
    /// side deleted the file after the sync point.
    pub head: Option<HeadState>,
}

impl ResolvedState {
    /// The side still holds exactly the synced content.
    pub fn unmodified(&self) -> bool {
        match (&self.head, self.blob) {
            (Some(head), Some(blob)) => head.blob == blob,
            _ => false,
        }
    }
}

/// Current location and content of a tracked path at a head commit.
#[derive(Debug, Clone)]
pub struct HeadState {
    pub commit: Oid,
    /// Path at the head; differs from the sync path after a rename.
    pub path: String,
    pub mode: i32,
    pub blob: Oid,
}

/// Fills one side's [`ResolvedState`] for every live record in the map.
pub fn resolve(
    repo: &Repository,
    side: Side,
    map: &mut ObjectMap,
    head: &Commit<'_>,
) -> Result<(), SyncError> {
    let head_tree = head.tree()?;
    let head_oid = head.id();

    // One diff per sync commit covers every path recorded at it.
    let mut groups: HashMap<Oid, Vec<usize>> = HashMap::new();
    for (idx, rec) in map.records().iter().enumerate() {
        if rec.skipped {
            continue;
        }
        groups.entry(side.sync_commit(rec)).or_default().push(idx);
    }

    for (sync_oid, indices) in groups {
        let Some(sync_commit) = repo::find_commit(repo, sync_oid)? else {
            // Rewritten or shallow history: the sync point is gone and
            // no ancestor can be produced for these paths.
            for &idx in &indices {
                let rec = &mut map.records_mut()[idx];
                warn!(
                    path = %rec.dst_path,
                    commit = %sync_oid,
                    side = ?side,
                    "sync commit not found; skipping path"
                );
                rec.skipped = true;
            }
            continue;
        };
        let sync_tree = sync_commit.tree()?;

        // Sync-time path -> slots expecting it. Several destinations
        // can share one source path within a group.
        let mut wanted: HashMap<String, Vec<usize>> = HashMap::new();
        for &idx in &indices {
            let path = side.sync_path(&map.records()[idx]).to_string();
            wanted.entry(path).or_default().push(idx);
        }

        // Seed: ancestor identity, and a head assumed unchanged until
        // a delta says otherwise.
        for (path, idxs) in &wanted {
            match repo::tree_entry(&sync_tree, Path::new(path))? {
                Some(entry) => {
                    let mode = entry.filemode();
                    let blob = entry.id();
                    for &idx in idxs {
                        let state = side.state_mut(&mut map.records_mut()[idx]);
                        state.mode = mode;
                        state.blob = Some(blob);
                        state.head = Some(HeadState {
                            commit: head_oid,
                            path: path.clone(),
                            mode,
                            blob,
                        });
                    }
                }
                // Absent from its own sync tree. A later Added delta
                // may still supply a head; otherwise the post-pass
                // drops the record.
                None => debug!(path = %path, commit = %sync_oid, side = ?side, "path absent at sync tree"),
            }
        }

        let mut diff_opts = DiffOptions::new();
        diff_opts.include_typechange(true);
        let mut diff = repo.diff_tree_to_tree(
            Some(&sync_tree),
            Some(&head_tree),
            Some(&mut diff_opts),
        )?;
        let mut find = DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))?;

        for delta in diff.deltas() {
            let old_path = delta.old_file().path().and_then(Path::to_str);
            let new_path = delta.new_file().path().and_then(Path::to_str);
            match delta.status() {
                Delta::Modified | Delta::Renamed | Delta::Copied => {
                    let Some(idxs) = old_path.and_then(|p| wanted.get(p)) else {
                        continue;
                    };
                    let Some(new_path) = new_path else { continue };
                    let Some(entry) = repo::tree_entry(&head_tree, Path::new(new_path))? else {
                        // The diff names a head path the head tree does
                        // not have; nothing trustworthy to merge with.
                        for &idx in idxs {
                            let rec = &mut map.records_mut()[idx];
                            warn!(path = %rec.dst_path, head_path = %new_path, side = ?side, "diff target missing from head tree; skipping path");
                            rec.skipped = true;
                        }
                        continue;
                    };
                    for &idx in idxs {
                        let state = side.state_mut(&mut map.records_mut()[idx]);
                        state.head = Some(HeadState {
                            commit: head_oid,
                            path: new_path.to_string(),
                            mode: entry.filemode(),
                            blob: delta.new_file().id(),
                        });
                    }
                }
                Delta::Deleted => {
                    let Some(idxs) = old_path.and_then(|p| wanted.get(p)) else {
                        continue;
                    };
                    for &idx in idxs {
                        let rec = &mut map.records_mut()[idx];
                        side.state_mut(rec).head = None;
                        if side == Side::Destination {
                            rec.deleted = true;
                        }
                    }
                }
                Delta::Added => {
                    // On the source side an added file is simply not
                    // tracked yet. On the destination side it means
                    // the path was recreated after the sync.
                    if side == Side::Source {
                        continue;
                    }
                    let Some(new_path) = new_path else { continue };
                    let Some(idxs) = wanted.get(new_path) else {
                        continue;
                    };
                    let Some(entry) = repo::tree_entry(&head_tree, Path::new(new_path))? else {
                        continue;
                    };
                    for &idx in idxs {
                        let state = side.state_mut(&mut map.records_mut()[idx]);
                        state.head = Some(HeadState {
                            commit: head_oid,
                            path: new_path.to_string(),
                            mode: entry.filemode(),
                            blob: delta.new_file().id(),
                        });
                    }
                }
                other => {
                    // Type changes and the like are not merged, only
                    // reported, and only when they hit a tracked path.
                    let tracked = old_path
                        .and_then(|p| wanted.get_key_value(p))
                        .or_else(|| new_path.and_then(|p| wanted.get_key_value(p)));
                    if let Some((path, _)) = tracked {
                        return Err(SyncError::UnsupportedDelta {
                            path: path.clone(),
                            kind: other,
                        });
                    }
                }
            }
        }

        // A record that got neither an ancestor nor a head on this
        // side carries no usable information.
        for &idx in &indices {
            let rec = &mut map.records_mut()[idx];
            if rec.skipped {
                continue;
            }
            let state = side.state(rec);
            if state.blob.is_none() && state.head.is_none() {
                warn!(
                    path = %rec.dst_path,
                    commit = %sync_oid,
                    side = ?side,
                    "path absent at its sync point; skipping"
                );
                rec.skipped = true;
            }
        }
    }

    Ok(())
}
