//! Repository access shared by the ops and sync layers.
//!
//! Opens the source and destination repositories by path, enforces the
//! clean-working-tree precondition, and wraps the handful of git2
//! lookups where "not found" is an expected answer.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use git2::{Commit, ErrorCode, Oid, Repository, Signature, StatusOptions, Tree, TreeEntry};
use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::ledger::RemoteSpec;

/// Regular blob mode as stored in tree entries.
pub const MODE_BLOB: i32 = 0o100_644;
/// Executable blob mode.
pub const MODE_EXECUTABLE: i32 = 0o100_755;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    #[error("failed to open repository at {0}: {1}")]
    Open(PathBuf, #[source] git2::Error),
    #[error("repository at {0} is bare; a working tree is required")]
    Bare(PathBuf),
    #[error("destination working tree has staged or modified files")]
    DirtyWorkTree,
    #[error("repository at {0} has no commits yet")]
    UnbornHead(PathBuf),
    #[error("refusing path with unsafe components: {0:?}")]
    UnsafePath(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl RepoError {
    pub fn transience(&self) -> Transience {
        match self {
            RepoError::Open(..)
            | RepoError::Bare(_)
            | RepoError::DirtyWorkTree
            | RepoError::UnbornHead(_)
            | RepoError::UnsafePath(_) => Transience::Permanent,
            RepoError::Io { .. } | RepoError::Git(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            RepoError::Open(..)
            | RepoError::Bare(_)
            | RepoError::DirtyWorkTree
            | RepoError::UnbornHead(_)
            | RepoError::UnsafePath(_) => Effect::None,
            RepoError::Io { .. } | RepoError::Git(_) => Effect::Unknown,
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> RepoError + '_ {
    move |source| RepoError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The pair of repositories an invocation operates on.
pub struct Workspace {
    pub src: Repository,
    pub dst: Repository,
}

impl Workspace {
    /// Opens the source repository (which must exist) and the
    /// destination repository (initialized in place when the path is
    /// not a repository yet).
    pub fn open(src: &Path, dst: &Path) -> Result<Self, RepoError> {
        let src = open(src)?;
        let dst = open_or_init(dst)?;
        Ok(Self { src, dst })
    }
}

pub fn open(path: &Path) -> Result<Repository, RepoError> {
    let repo = Repository::open(path).map_err(|e| RepoError::Open(path.to_path_buf(), e))?;
    if repo.is_bare() {
        return Err(RepoError::Bare(path.to_path_buf()));
    }
    Ok(repo)
}

pub fn open_or_init(path: &Path) -> Result<Repository, RepoError> {
    match Repository::open(path) {
        Ok(repo) if repo.is_bare() => Err(RepoError::Bare(path.to_path_buf())),
        Ok(repo) => Ok(repo),
        Err(err) if err.code() == ErrorCode::NotFound => {
            tracing::info!(path = %path.display(), "initializing destination repository");
            Repository::init(path).map_err(|e| RepoError::Open(path.to_path_buf(), e))
        }
        Err(err) => Err(RepoError::Open(path.to_path_buf(), err)),
    }
}

/// Working directory of a non-bare repository.
pub fn workdir(repo: &Repository) -> Result<&Path, RepoError> {
    repo.workdir()
        .ok_or_else(|| RepoError::Bare(repo.path().to_path_buf()))
}

/// Commit at the current branch tip, or `None` on an unborn HEAD.
pub fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, RepoError> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Like [`head_commit`] but an unborn HEAD is an error.
pub fn require_head_commit(repo: &Repository) -> Result<Commit<'_>, RepoError> {
    head_commit(repo)?.ok_or_else(|| RepoError::UnbornHead(repo.path().to_path_buf()))
}

/// Tree entry lookup where an absent path is an expected answer.
pub fn tree_entry(tree: &Tree<'_>, path: &Path) -> Result<Option<TreeEntry<'static>>, RepoError> {
    match tree.get_path(path) {
        Ok(entry) => Ok(Some(entry)),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Commit lookup where a missing object is an expected answer
/// (rewritten or shallow history).
pub fn find_commit(repo: &Repository, oid: Oid) -> Result<Option<Commit<'_>>, RepoError> {
    match repo.find_commit(oid) {
        Ok(commit) => Ok(Some(commit)),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn blob_bytes(repo: &Repository, oid: Oid) -> Result<Vec<u8>, RepoError> {
    Ok(repo.find_blob(oid)?.content().to_vec())
}

/// Whether the working tree matches HEAD and the index.
///
/// Untracked files count as dirt (they may collide with copy targets);
/// ignored files do not.
pub fn is_clean(repo: &Repository) -> Result<bool, RepoError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .include_ignored(false)
        .recurse_untracked_dirs(true);
    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(statuses.is_empty())
}

/// Precondition for every mutating operation: refuse to touch a dirty
/// destination, before any file is written.
pub fn ensure_clean(repo: &Repository) -> Result<(), RepoError> {
    if is_clean(repo)? {
        Ok(())
    } else {
        Err(RepoError::DirtyWorkTree)
    }
}

/// Remotes of a repository, in configuration order.
pub fn remotes(repo: &Repository) -> Result<Vec<RemoteSpec>, RepoError> {
    let names = repo.remotes()?;
    let mut specs = Vec::with_capacity(names.len());
    for name in names.iter().flatten() {
        let remote = repo.find_remote(name)?;
        specs.push(RemoteSpec::new(name, remote.url().unwrap_or_default()));
    }
    Ok(specs)
}

/// Commit signature from repository config, with a host-identity
/// fallback when `user.name`/`user.email` are unset.
pub fn signature(repo: &Repository) -> Result<Signature<'static>, RepoError> {
    match repo.signature() {
        Ok(sig) => Ok(sig),
        Err(err) if err.code() == ErrorCode::NotFound => {
            let user = whoami::username();
            let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
            Ok(Signature::now(&user, &format!("{user}@{host}"))?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Absolute working-tree location for a repository-relative path.
///
/// Rejects absolute paths and `..` components so a crafted ledger can
/// never direct a write outside the working tree.
pub fn worktree_path(repo: &Repository, rel: &str) -> Result<PathBuf, RepoError> {
    let rel_path = Path::new(rel);
    let safe = !rel.is_empty()
        && rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(RepoError::UnsafePath(rel.to_string()));
    }
    Ok(workdir(repo)?.join(rel_path))
}

/// Write file content into the working tree, creating parent
/// directories as needed.
pub fn write_worktree_file(
    repo: &Repository,
    rel: &str,
    bytes: &[u8],
    executable: bool,
) -> Result<(), RepoError> {
    let target = worktree_path(repo, rel)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    fs::write(&target, bytes).map_err(io_err(&target))?;
    if executable {
        set_executable(&target).map_err(io_err(&target))?;
    }
    Ok(())
}

/// Remove a file from the working tree. Returns whether anything was
/// there to remove.
pub fn remove_worktree_file(repo: &Repository, rel: &str) -> Result<bool, RepoError> {
    let target = worktree_path(repo, rel)?;
    match fs::remove_file(&target) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(RepoError::Io {
            path: target,
            source: err,
        }),
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
