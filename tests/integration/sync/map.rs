//! Rebuilding the tracked-path map from destination history.

use git2::Oid;

use graft::ledger::{ProvenanceRecord, RecordEntries, RemoteSpec};
use graft::sync::{SyncError, map};

use crate::fixtures::rig::Rig;

fn oid(byte: u8) -> Oid {
    Oid::from_str(&format!("{byte:02x}").repeat(20)).expect("synthetic oid")
}

fn files_record(upstream: Oid, pairs: &[(&str, &str)]) -> String {
    ProvenanceRecord::new(
        vec![RemoteSpec::new("origin", "https://example.com/upstream.git")],
        upstream,
        RecordEntries::Files(
            pairs
                .iter()
                .map(|(src, dst)| (src.to_string(), dst.to_string()))
                .collect(),
        ),
    )
    .encode()
}

fn rename_record(upstream: Oid, old: &str, new: &str) -> String {
    ProvenanceRecord::new(
        Vec::new(),
        upstream,
        RecordEntries::Rename {
            old: old.to_string(),
            new: new.to_string(),
        },
    )
    .encode()
}

#[test]
fn plain_commits_carry_no_records() {
    let rig = Rig::new();
    rig.write_dst("notes.md", "just text\n");
    rig.commit_dst("write some notes\n\nnothing structured here");

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert!(map.is_empty());
}

#[test]
fn empty_history_yields_empty_map() {
    let rig = Rig::new();
    let map = map::build(&rig.dst_repo()).expect("build map");
    assert!(map.is_empty());
}

#[test]
fn record_closer_to_tip_wins() {
    let rig = Rig::new();
    rig.commit_dst(&files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")]));
    rig.commit_dst(&files_record(oid(0x22), &[("lib/a.rs", "vendor/a.rs")]));

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 1);
    let rec = &map.records()[0];
    assert_eq!(rec.src_commit, oid(0x22));
    assert_eq!(rec.dst_path, "vendor/a.rs");
}

#[test]
fn renames_redirect_older_records() {
    let rig = Rig::new();
    rig.commit_dst(&files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")]));
    rig.commit_dst(&rename_record(oid(0x11), "vendor/a.rs", "src/a.rs"));

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 1);
    let rec = &map.records()[0];
    assert_eq!(rec.dst_path, "src/a.rs");
    assert_eq!(rec.dst_path_at_sync, "vendor/a.rs");
    assert_eq!(rec.src_path, "lib/a.rs");
    assert_eq!(map.index_of_dst("src/a.rs"), Some(0));
    assert_eq!(map.index_of_dst("vendor/a.rs"), None);
}

#[test]
fn rename_chain_is_followed_transitively() {
    let rig = Rig::new();
    rig.commit_dst(&files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")]));
    rig.commit_dst(&rename_record(oid(0x11), "vendor/a.rs", "src/a.rs"));
    rig.commit_dst(&rename_record(oid(0x11), "src/a.rs", "core/a.rs"));

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 1);
    assert_eq!(map.records()[0].dst_path, "core/a.rs");
    assert_eq!(map.records()[0].dst_path_at_sync, "vendor/a.rs");
}

#[test]
fn newer_record_is_not_redirected_by_older_rename() {
    // The old name was re-tracked after the rename, so both files are
    // live: the moved one and the fresh copy under the original name.
    let rig = Rig::new();
    rig.commit_dst(&files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")]));
    rig.commit_dst(&rename_record(oid(0x11), "vendor/a.rs", "src/a.rs"));
    rig.commit_dst(&files_record(oid(0x22), &[("lib/a.rs", "vendor/a.rs")]));

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 2);

    let fresh = map.index_of_dst("vendor/a.rs").expect("fresh slot");
    assert_eq!(map.records()[fresh].src_commit, oid(0x22));
    let moved = map.index_of_dst("src/a.rs").expect("moved slot");
    assert_eq!(map.records()[moved].src_commit, oid(0x11));
}

#[test]
fn one_source_path_may_feed_several_destinations() {
    let rig = Rig::new();
    rig.commit_dst(&files_record(
        oid(0x11),
        &[("lib/a.rs", "vendor/one.rs"), ("lib/a.rs", "vendor/two.rs")],
    ));

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 2);
    assert_eq!(map.indices_of_src("lib/a.rs").len(), 2);
}

#[test]
fn orphan_rename_is_rejected() {
    let rig = Rig::new();
    rig.commit_dst(&files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")]));
    rig.commit_dst(&rename_record(oid(0x11), "ghost.rs", "gone.rs"));

    let err = map::build(&rig.dst_repo()).unwrap_err();
    assert!(matches!(err, SyncError::OrphanRename { old, .. } if old == "ghost.rs"));
}

#[test]
fn malformed_record_aborts_the_walk() {
    let rig = Rig::new();
    rig.commit_dst("graft\n\nhash:\n  not-a-hash\n");

    let err = map::build(&rig.dst_repo()).unwrap_err();
    assert!(matches!(err, SyncError::MalformedLedger { .. }));
}

#[test]
fn trailing_text_after_record_is_ignored() {
    let rig = Rig::new();
    let message = format!(
        "{}\nSynced by the nightly vendor job.\n",
        files_record(oid(0x11), &[("lib/a.rs", "vendor/a.rs")])
    );
    rig.commit_dst(&message);

    let map = map::build(&rig.dst_repo()).expect("build map");
    assert_eq!(map.len(), 1);
    assert_eq!(map.records()[0].src_commit, oid(0x11));
}
