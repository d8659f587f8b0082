//! Recovers the set of tracked paths from destination history alone.
//!
//! Sync records live in commit messages, so the full tracking state is
//! rebuilt on every run by walking backward from the destination tip.
//! The walk is breadth-first over all parents: when two records claim
//! the same destination path, the one fewer edges from the tip wins,
//! which makes re-syncs supersede the original tracking commit.

use std::collections::{HashMap, HashSet, VecDeque};

use git2::{Oid, Repository};
use tracing::{debug, trace};

use crate::ledger::{ProvenanceRecord, RecordEntries, RemoteSpec};
use crate::repo;

use super::error::SyncError;
use super::resolve::ResolvedState;

/// One tracked destination file and the sync points it was last
/// reconciled at.
#[derive(Debug, Clone)]
pub struct TrackedPath {
    /// Name at the destination tip, after applying rename records.
    pub dst_path: String,
    /// Name the establishing sync commit knew it by.
    pub dst_path_at_sync: String,
    /// Source-side name as of the sync commit.
    pub src_path: String,
    /// Upstream commit the content was last taken from.
    pub src_commit: Oid,
    /// Destination commit that recorded the sync.
    pub dst_commit: Oid,
    /// Remotes recorded alongside the sync point.
    pub remotes: Vec<RemoteSpec>,
    /// The destination deleted the file after the sync point.
    pub deleted: bool,
    /// Dropped from this run; set when a side cannot be resolved.
    pub skipped: bool,
    /// Filled in by the head-state resolver.
    pub src_state: ResolvedState,
    pub dst_state: ResolvedState,
}

impl TrackedPath {
    fn new(
        src_path: String,
        dst_path_at_sync: String,
        dst_path: String,
        record: &ProvenanceRecord,
        dst_commit: Oid,
    ) -> Self {
        TrackedPath {
            dst_path,
            dst_path_at_sync,
            src_path,
            src_commit: record.upstream,
            dst_commit,
            remotes: record.remotes.clone(),
            deleted: false,
            skipped: false,
            src_state: ResolvedState::default(),
            dst_state: ResolvedState::default(),
        }
    }
}

/// Tracked paths in one arena, indexed from both repository views.
///
/// Both resolvers and the merger address the same slot by index, so a
/// source-side update and a destination-side update to one file can
/// never drift apart.
#[derive(Debug, Default)]
pub struct ObjectMap {
    records: Vec<TrackedPath>,
    by_dst: HashMap<String, usize>,
    by_src: HashMap<String, Vec<usize>>,
}

impl ObjectMap {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrackedPath] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [TrackedPath] {
        &mut self.records
    }

    /// Slot for a current destination path.
    pub fn index_of_dst(&self, path: &str) -> Option<usize> {
        self.by_dst.get(path).copied()
    }

    /// Slots fed by a source path. Several destinations may vendor the
    /// same upstream file.
    pub fn indices_of_src(&self, path: &str) -> &[usize] {
        self.by_src.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn insert(&mut self, record: TrackedPath) {
        let idx = self.records.len();
        self.by_dst.insert(record.dst_path.clone(), idx);
        self.by_src
            .entry(record.src_path.clone())
            .or_default()
            .push(idx);
        self.records.push(record);
    }
}

/// Walks destination history and rebuilds the tracked-path map.
///
/// Aborts on a malformed record: a commit that carries the sentinel but
/// fails to decode means the history can no longer be interpreted.
pub fn build(dst: &Repository) -> Result<ObjectMap, SyncError> {
    let Some(tip) = repo::head_commit(dst)? else {
        debug!("destination has no commits; nothing is tracked");
        return Ok(ObjectMap::default());
    };

    let mut map = ObjectMap::default();
    // old name -> new name, from rename records. Walk order guarantees
    // a rename is seen before every record older than it, so newer
    // records are never redirected by it.
    let mut redirects: HashMap<String, String> = HashMap::new();

    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();
    visited.insert(tip.id());
    queue.push_back(tip.id());

    while let Some(oid) = queue.pop_front() {
        let commit = dst.find_commit(oid)?;
        for parent in commit.parent_ids() {
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }

        // Non-UTF-8 messages cannot carry a record.
        let Some(message) = commit.message() else {
            continue;
        };
        let record = ProvenanceRecord::decode(message)
            .map_err(|source| SyncError::MalformedLedger { commit: oid, source })?;
        let Some(record) = record else {
            continue;
        };

        match &record.entries {
            RecordEntries::Files(pairs) => {
                for (src_path, dst_path) in pairs {
                    let current = resolve_redirect(&redirects, dst_path)?;
                    if map.by_dst.contains_key(&current) {
                        trace!(path = %current, commit = %oid, "older record superseded");
                        continue;
                    }
                    map.insert(TrackedPath::new(
                        src_path.clone(),
                        dst_path.clone(),
                        current,
                        &record,
                        oid,
                    ));
                }
            }
            RecordEntries::Rename { old, new } => {
                // Two renames of one old name can only happen when the
                // path was recreated; keep the newer mapping.
                redirects.entry(old.clone()).or_insert_with(|| new.clone());
            }
        }
    }

    // A redirect chain that never reaches a tracked path means the
    // rename commit outlived the file it renamed.
    for (old, new) in &redirects {
        let terminal = resolve_redirect(&redirects, old)?;
        if !map.by_dst.contains_key(&terminal) {
            return Err(SyncError::OrphanRename {
                old: old.clone(),
                new: new.clone(),
            });
        }
    }

    debug!(
        tracked = map.len(),
        commits = visited.len(),
        renames = redirects.len(),
        "object map built"
    );
    Ok(map)
}

/// Follows rename redirects to the current name of a destination path.
fn resolve_redirect(
    redirects: &HashMap<String, String>,
    path: &str,
) -> Result<String, SyncError> {
    let mut current = path;
    let mut hops = 0usize;
    while let Some(next) = redirects.get(current) {
        current = next;
        hops += 1;
        if hops > redirects.len() {
            return Err(SyncError::RenameCycle(path.to_string()));
        }
    }
    Ok(current.to_string())
}
