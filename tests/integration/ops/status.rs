//! Status reporting across tracked paths.

use graft::ops;
use graft::repo;

use crate::fixtures::rig::Rig;

#[test]
fn status_lists_tracked_paths_sorted() {
    let rig = Rig::new();
    rig.write_src("lib/b.rs", "b\n");
    rig.write_src("lib/a.rs", "a\n");
    let upstream = rig.commit_src("add lib");
    let ws = rig.workspace();
    ops::object::run(&ws, "lib", Some("vendor")).expect("track lib");

    let dst = repo::open(&rig.dst_dir).expect("open destination");
    let report = ops::status::run(&dst).expect("status");

    let paths: Vec<&str> = report.tracked.iter().map(|t| t.path.as_str()).collect();
    assert_eq!(paths, vec!["vendor/a.rs", "vendor/b.rs"]);
    assert_eq!(report.tracked[0].source, "lib/a.rs");
    assert_eq!(report.tracked[0].source_commit, upstream.to_string());
    assert!(!report.tracked[0].dirty);
}

#[test]
fn status_flags_locally_modified_paths() {
    let rig = Rig::new();
    rig.write_src("lib/a.rs", "a\n");
    rig.write_src("lib/b.rs", "b\n");
    rig.commit_src("add lib");
    let ws = rig.workspace();
    ops::object::run(&ws, "lib", Some("vendor")).expect("track lib");

    rig.write_dst("vendor/a.rs", "edited locally\n");

    let dst = repo::open(&rig.dst_dir).expect("open destination");
    let report = ops::status::run(&dst).expect("status");

    assert!(report.tracked[0].dirty);
    assert!(!report.tracked[1].dirty);
}

#[test]
fn status_is_empty_without_records() {
    let rig = Rig::new();
    rig.write_dst("notes.txt", "plain\n");
    rig.commit_dst("just a note");

    let dst = repo::open(&rig.dst_dir).expect("open destination");
    let report = ops::status::run(&dst).expect("status");
    assert!(report.tracked.is_empty());
}

#[test]
fn status_follows_renames() {
    let rig = Rig::new();
    rig.write_src("a.txt", "hi\n");
    rig.commit_src("add a");
    let ws = rig.workspace();
    ops::object::run(&ws, "a.txt", None).expect("track a");
    ops::rename::run(&ws, "a.txt", "moved/a.txt").expect("rename a");

    let dst = repo::open(&rig.dst_dir).expect("open destination");
    let report = ops::status::run(&dst).expect("status");

    assert_eq!(report.tracked.len(), 1);
    assert_eq!(report.tracked[0].path, "moved/a.txt");
    assert_eq!(report.tracked[0].source, "a.txt");
}
