//! Tracking source objects into the destination repository.

use std::fs;

use graft::Workspace;
use graft::ledger::RecordEntries;
use graft::ops::{self, OpsError};
use graft::repo::RepoError;

use crate::fixtures::rig::{Rig, UPSTREAM_URL};

#[test]
fn track_single_file_commits_record() {
    let rig = Rig::new();
    rig.write_src("lib/util.rs", "pub fn id(x: u32) -> u32 { x }\n");
    let upstream = rig.commit_src("add util");

    let ws = rig.workspace();
    let outcome = ops::object::run(&ws, "lib/util.rs", None).expect("track file");

    assert_eq!(
        outcome.copied,
        vec![("lib/util.rs".to_string(), "lib/util.rs".to_string())]
    );
    assert_eq!(outcome.commit, Some(rig.dst_head()));
    assert_eq!(
        rig.read_dst("lib/util.rs"),
        "pub fn id(x: u32) -> u32 { x }\n"
    );

    let record = rig.decode_dst_head();
    assert_eq!(record.upstream, upstream);
    assert_eq!(record.remotes.len(), 1);
    assert_eq!(record.remotes[0].name, "origin");
    assert_eq!(record.remotes[0].url, UPSTREAM_URL);
    assert_eq!(
        record.entries,
        RecordEntries::Files(vec![("lib/util.rs".into(), "lib/util.rs".into())])
    );
}

#[test]
fn track_directory_re_roots_destination_paths() {
    let rig = Rig::new();
    rig.write_src("lib/a.rs", "pub const A: u8 = 1;\n");
    rig.write_src("lib/sub/b.rs", "pub const B: u8 = 2;\n");
    rig.commit_src("add lib");

    let ws = rig.workspace();
    let outcome = ops::object::run(&ws, "lib", Some("vendor")).expect("track directory");

    assert_eq!(
        outcome.copied,
        vec![
            ("lib/a.rs".to_string(), "vendor/a.rs".to_string()),
            ("lib/sub/b.rs".to_string(), "vendor/sub/b.rs".to_string()),
        ]
    );
    assert_eq!(rig.read_dst("vendor/a.rs"), "pub const A: u8 = 1;\n");
    assert_eq!(rig.read_dst("vendor/sub/b.rs"), "pub const B: u8 = 2;\n");
}

#[test]
fn retracking_identical_content_skips_commit() {
    let rig = Rig::new();
    rig.write_src("a.txt", "same\n");
    rig.commit_src("add a");

    let ws = rig.workspace();
    ops::object::run(&ws, "a.txt", None).expect("first track");
    let head = rig.dst_head();

    let second = ops::object::run(&ws, "a.txt", None).expect("second track");
    assert!(second.commit.is_none());
    assert_eq!(rig.dst_head(), head);
}

#[test]
fn track_missing_source_fails() {
    let rig = Rig::new();
    rig.write_src("a.txt", "hi\n");
    rig.commit_src("add a");

    let ws = rig.workspace();
    let err = ops::object::run(&ws, "no/such/file.rs", None).unwrap_err();
    assert!(matches!(err, OpsError::SourceMissing(_)));
}

#[test]
fn track_requires_source_commits() {
    let rig = Rig::new();
    rig.write_src("a.txt", "uncommitted\n");

    let ws = rig.workspace();
    let err = ops::object::run(&ws, "a.txt", None).unwrap_err();
    assert!(matches!(err, OpsError::Repo(RepoError::UnbornHead(_))));
}

#[test]
fn track_rejects_dirty_destination() {
    let rig = Rig::new();
    rig.write_src("a.txt", "hi\n");
    rig.commit_src("add a");
    rig.write_dst("scratch.txt", "uncommitted\n");

    let ws = rig.workspace();
    let err = ops::object::run(&ws, "a.txt", None).unwrap_err();
    assert!(matches!(err, OpsError::Repo(RepoError::DirtyWorkTree)));
}

#[test]
fn track_initializes_missing_destination() {
    let rig = Rig::new();
    rig.write_src("a.txt", "hi\n");
    rig.commit_src("add a");

    let fresh = rig.root().join("fresh");
    let ws = Workspace::open(&rig.src_dir, &fresh).expect("open workspace");
    let outcome = ops::object::run(&ws, "a.txt", None).expect("track into new repo");

    assert!(outcome.commit.is_some());
    assert!(fresh.join(".git").exists());
    assert_eq!(
        fs::read_to_string(fresh.join("a.txt")).expect("read copy"),
        "hi\n"
    );
}

#[cfg(unix)]
#[test]
fn track_preserves_executable_bit() {
    use std::os::unix::fs::PermissionsExt;

    let rig = Rig::new();
    rig.write_src("tools/gen.sh", "#!/bin/sh\necho hi\n");
    let script = rig.src_dir.join("tools/gen.sh");
    let mut perms = fs::metadata(&script).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).expect("chmod script");
    rig.commit_src("add generator");

    let ws = rig.workspace();
    ops::object::run(&ws, "tools/gen.sh", None).expect("track script");

    let mode = fs::metadata(rig.dst_dir.join("tools/gen.sh"))
        .expect("copy metadata")
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0);
}
