#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository};
use tempfile::TempDir;

use graft::Workspace;
use graft::ledger::ProvenanceRecord;

use super::git;

pub const UPSTREAM_URL: &str = "https://example.com/upstream.git";

/// A source repository and a destination repository under one temp
/// root, both configured for committing.
pub struct Rig {
    root: TempDir,
    pub src_dir: PathBuf,
    pub dst_dir: PathBuf,
}

impl Rig {
    pub fn new() -> Self {
        let root = TempDir::new().expect("temp root");
        let src_dir = root.path().join("upstream");
        let dst_dir = root.path().join("project");
        let src = git::init_repo(&src_dir).expect("init source repo");
        git::add_origin_remote(&src, UPSTREAM_URL).expect("add origin remote");
        git::init_repo(&dst_dir).expect("init destination repo");
        Self {
            root,
            src_dir,
            dst_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::open(&self.src_dir, &self.dst_dir).expect("open workspace")
    }

    pub fn src_repo(&self) -> Repository {
        Repository::open(&self.src_dir).expect("open source repo")
    }

    pub fn dst_repo(&self) -> Repository {
        Repository::open(&self.dst_dir).expect("open destination repo")
    }

    pub fn write_src(&self, rel: &str, content: &str) {
        write_file(&self.src_dir, rel, content);
    }

    pub fn write_dst(&self, rel: &str, content: &str) {
        write_file(&self.dst_dir, rel, content);
    }

    pub fn remove_src(&self, rel: &str) {
        fs::remove_file(self.src_dir.join(rel)).expect("remove source file");
    }

    pub fn remove_dst(&self, rel: &str) {
        fs::remove_file(self.dst_dir.join(rel)).expect("remove destination file");
    }

    pub fn commit_src(&self, message: &str) -> Oid {
        commit_all(&self.src_dir, message)
    }

    pub fn commit_dst(&self, message: &str) -> Oid {
        commit_all(&self.dst_dir, message)
    }

    pub fn read_dst(&self, rel: &str) -> String {
        fs::read_to_string(self.dst_dir.join(rel)).expect("read destination file")
    }

    pub fn dst_exists(&self, rel: &str) -> bool {
        self.dst_dir.join(rel).exists()
    }

    pub fn src_head(&self) -> Oid {
        head_oid(&self.src_dir)
    }

    pub fn dst_head(&self) -> Oid {
        head_oid(&self.dst_dir)
    }

    pub fn dst_head_message(&self) -> String {
        head_message(&self.dst_dir)
    }

    /// Decodes the record carried by the destination head commit.
    pub fn decode_dst_head(&self) -> ProvenanceRecord {
        ProvenanceRecord::decode(&self.dst_head_message())
            .expect("decode head record")
            .expect("head commit carries a record")
    }
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, content).expect("write file");
}

/// Stages every addition, modification and deletion, then commits.
pub fn commit_all(repo_dir: &Path, message: &str) -> Oid {
    let repo = Repository::open(repo_dir).expect("open repo");
    let mut index = repo.index().expect("repo index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("stage additions");
    index.update_all(["*"], None).expect("stage removals");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let sig = repo.signature().expect("signature");
    let parent = repo
        .head()
        .ok()
        .map(|head| head.peel_to_commit().expect("head commit"));
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("commit")
}

pub fn head_oid(repo_dir: &Path) -> Oid {
    let repo = Repository::open(repo_dir).expect("open repo");
    let head = repo.head().expect("repo head");
    head.peel_to_commit().expect("head commit").id()
}

pub fn head_message(repo_dir: &Path) -> String {
    let repo = Repository::open(repo_dir).expect("open repo");
    let head = repo.head().expect("repo head");
    head.peel_to_commit()
        .expect("head commit")
        .message()
        .expect("utf8 message")
        .to_string()
}
