//! Renaming tracked files and the rename records left behind.

use graft::ledger::RecordEntries;
use graft::ops::{self, OpsError};

use crate::fixtures::rig::Rig;

fn tracked_rig(path: &str, content: &str) -> Rig {
    let rig = Rig::new();
    rig.write_src(path, content);
    rig.commit_src("add file");
    let ws = rig.workspace();
    ops::object::run(&ws, path, None).expect("track file");
    rig
}

#[test]
fn rename_moves_file_and_records_it() {
    let rig = tracked_rig("lib/util.rs", "pub fn noop() {}\n");
    let ws = rig.workspace();

    let commit = ops::rename::run(&ws, "lib/util.rs", "src/vendored.rs").expect("rename");

    assert_eq!(rig.dst_head(), commit);
    assert!(!rig.dst_exists("lib/util.rs"));
    assert_eq!(rig.read_dst("src/vendored.rs"), "pub fn noop() {}\n");
    assert_eq!(
        rig.decode_dst_head().entries,
        RecordEntries::Rename {
            old: "lib/util.rs".to_string(),
            new: "src/vendored.rs".to_string(),
        }
    );
}

#[test]
fn rename_of_untracked_path_fails() {
    let rig = tracked_rig("a.txt", "hi\n");
    let ws = rig.workspace();

    let err = ops::rename::run(&ws, "b.txt", "c.txt").unwrap_err();
    assert!(matches!(err, OpsError::NotTracked(p) if p == "b.txt"));
}

#[test]
fn rename_onto_tracked_path_fails() {
    let rig = Rig::new();
    rig.write_src("a.txt", "a\n");
    rig.write_src("b.txt", "b\n");
    rig.commit_src("add files");
    let ws = rig.workspace();
    ops::object::run(&ws, "a.txt", None).expect("track a");
    ops::object::run(&ws, "b.txt", None).expect("track b");

    let err = ops::rename::run(&ws, "a.txt", "b.txt").unwrap_err();
    assert!(matches!(err, OpsError::TargetExists(p) if p == "b.txt"));
}

#[test]
fn rename_onto_existing_untracked_file_fails() {
    let rig = tracked_rig("a.txt", "a\n");
    rig.write_dst("existing.txt", "keep me\n");
    rig.commit_dst("note to self");
    let ws = rig.workspace();

    let err = ops::rename::run(&ws, "a.txt", "existing.txt").unwrap_err();
    assert!(matches!(err, OpsError::TargetExists(_)));
    assert_eq!(rig.read_dst("existing.txt"), "keep me\n");
}
