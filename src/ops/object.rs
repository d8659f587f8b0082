//! Starts tracking a file or directory from the source repository.
//!
//! Content is copied byte-for-byte from the source working tree into
//! the destination working tree, staged, and committed under a sync
//! record naming every copied pair and the source head commit.

use std::fs;
use std::io;
use std::path::Path;

use git2::Oid;
use tracing::{debug, info};

use crate::ledger::{ProvenanceRecord, RecordEntries};
use crate::repo::{self, Workspace};

use super::OpsError;

/// Result of one track operation.
#[derive(Debug)]
pub struct TrackOutcome {
    /// Source to destination pairs copied, in record order.
    pub copied: Vec<(String, String)>,
    /// The tracking commit; absent when nothing changed.
    pub commit: Option<Oid>,
}

/// Tracks `src_spec` (a file or a directory) from the source into the
/// destination, at `dst_spec` or under the same name.
///
/// Re-running with unchanged content is a no-op: the copies land on
/// identical bytes and no commit is created.
pub fn run(
    ws: &Workspace,
    src_spec: &str,
    dst_spec: Option<&str>,
) -> Result<TrackOutcome, OpsError> {
    repo::ensure_clean(&ws.dst)?;
    let src_head = repo::require_head_commit(&ws.src)?;
    let src_root = repo::workdir(&ws.src)?;

    let src_spec = normalize(src_spec);
    let dst_spec = dst_spec.map(normalize).unwrap_or(src_spec);

    let sources = expand(src_root, src_spec)?;
    if sources.is_empty() {
        info!(src = src_spec, "source expanded to no files; nothing to track");
        return Ok(TrackOutcome {
            copied: Vec::new(),
            commit: None,
        });
    }

    let mut copied = Vec::with_capacity(sources.len());
    for src_rel in sources {
        let dst_rel = re_root(&src_rel, src_spec, dst_spec);
        let abs = src_root.join(&src_rel);
        let bytes = fs::read(&abs).map_err(|source| OpsError::Io {
            path: abs.clone(),
            source,
        })?;
        let exec = is_executable(&abs)?;
        repo::write_worktree_file(&ws.dst, &dst_rel, &bytes, exec)?;
        debug!(src = %src_rel, dst = %dst_rel, bytes = bytes.len(), "copied");
        copied.push((src_rel, dst_rel));
    }

    let mut index = ws.dst.index()?;
    for (_, dst_rel) in &copied {
        index.add_path(Path::new(dst_rel))?;
    }
    index.write()?;
    let tree_oid = index.write_tree()?;

    let parent = repo::head_commit(&ws.dst)?;
    if let Some(parent) = &parent {
        if tree_oid == parent.tree_id() {
            info!(files = copied.len(), "already tracked with identical content");
            return Ok(TrackOutcome {
                copied,
                commit: None,
            });
        }
    }

    let tree = ws.dst.find_tree(tree_oid)?;
    let record = ProvenanceRecord::new(
        repo::remotes(&ws.src)?,
        src_head.id(),
        RecordEntries::Files(copied.clone()),
    );
    let sig = repo::signature(&ws.dst)?;
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = ws.dst.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &record.encode(),
        &tree,
        &parents,
    )?;
    info!(commit = %oid, files = copied.len(), "tracked");
    Ok(TrackOutcome {
        copied,
        commit: Some(oid),
    })
}

/// Strips trailing slashes and maps `.` to the repository root.
fn normalize(spec: &str) -> &str {
    let spec = spec.trim_end_matches('/');
    if spec == "." { "" } else { spec }
}

/// Expands a spec into repository-relative file paths, sorted so the
/// commit record is stable across runs.
fn expand(root: &Path, spec: &str) -> Result<Vec<String>, OpsError> {
    let abs = root.join(spec);
    let meta = match fs::metadata(&abs) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(OpsError::SourceMissing(abs));
        }
        Err(source) => return Err(OpsError::Io { path: abs, source }),
    };
    if !meta.is_dir() {
        return Ok(vec![spec.to_string()]);
    }
    let mut files = Vec::new();
    collect(root, Path::new(spec), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(root: &Path, rel: &Path, out: &mut Vec<String>) -> Result<(), OpsError> {
    let abs = root.join(rel);
    let io_err = |source| OpsError::Io {
        path: abs.clone(),
        source,
    };
    for entry in fs::read_dir(&abs).map_err(io_err)? {
        let entry = entry.map_err(|source| OpsError::Io {
            path: abs.clone(),
            source,
        })?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let child = rel.join(&name);
        let file_type = entry.file_type().map_err(|source| OpsError::Io {
            path: entry.path(),
            source,
        })?;
        if file_type.is_dir() {
            collect(root, &child, out)?;
        } else {
            let path = child
                .to_str()
                .ok_or_else(|| OpsError::NonUnicodePath(child.clone()))?;
            out.push(path.to_string());
        }
    }
    Ok(())
}

/// Re-roots a path from the source spec onto the destination spec.
fn re_root(path: &str, src_spec: &str, dst_spec: &str) -> String {
    if path == src_spec {
        return dst_spec.to_string();
    }
    let rest = match path.strip_prefix(src_spec) {
        Some(rest) if src_spec.is_empty() => rest,
        Some(rest) => match rest.strip_prefix('/') {
            Some(rest) => rest,
            // Prefix match not on a path boundary.
            None => return path.to_string(),
        },
        None => return path.to_string(),
    };
    if dst_spec.is_empty() {
        rest.to_string()
    } else {
        format!("{dst_spec}/{rest}")
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool, OpsError> {
    use std::os::unix::fs::PermissionsExt;
    let meta = fs::metadata(path).map_err(|source| OpsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> Result<bool, OpsError> {
    Ok(false)
}
