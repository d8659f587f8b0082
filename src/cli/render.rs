//! Human renderer for CLI outputs.
//!
//! This module is pure formatting; handlers gather any extra data needed.

use git2::Oid;

use crate::ops::{StatusReport, TrackOutcome};
use crate::sync::UpdateReport;

pub(super) fn render_track(outcome: &TrackOutcome) -> String {
    let mut out = String::new();
    match outcome.commit {
        Some(commit) => out.push_str(&format!(
            "✓ tracked {} file(s) at {}\n",
            outcome.copied.len(),
            short_oid(&commit)
        )),
        None => out.push_str("nothing new to track\n"),
    }
    for (src, dst) in &outcome.copied {
        out.push_str(&format!("  {src} -> {dst}\n"));
    }
    out.truncate(out.trim_end().len());
    out
}

pub(super) fn render_rename(old: &str, new: &str, commit: Oid) -> String {
    format!("✓ renamed {old} -> {new} at {}", short_oid(&commit))
}

pub(super) fn render_status(report: &StatusReport) -> String {
    if report.tracked.is_empty() {
        return "no tracked paths".to_string();
    }
    let mut out = String::new();
    for path in &report.tracked {
        let dirty = if path.dirty { " (dirty)" } else { "" };
        out.push_str(&format!(
            "{} <- {} @ {}{}\n",
            path.path,
            path.source,
            short(&path.source_commit),
            dirty
        ));
    }
    out.truncate(out.trim_end().len());
    out
}

pub(super) fn render_update(report: &UpdateReport) -> String {
    if report.has_conflicts() {
        let mut out = String::from("merge conflicts:\n");
        for path in &report.conflicts {
            out.push_str(&format!("  {path}\n"));
        }
        out.push_str("no sync commit created; resolve by hand and commit");
        return out;
    }

    match &report.commit {
        None if report.merged.is_empty() && report.removed.is_empty() => format!(
            "all up to date ({} unchanged, {} skipped)",
            report.unchanged, report.skipped
        ),
        None => "working tree already matched the merge result; nothing committed".to_string(),
        Some(commit) => {
            let mut out = format!("✓ synced at {}\n", short(commit));
            for path in &report.merged {
                out.push_str(&format!("  merged  {path}\n"));
            }
            for path in &report.removed {
                out.push_str(&format!("  removed {path}\n"));
            }
            out.push_str(&format!(
                "  {} unchanged, {} skipped",
                report.unchanged, report.skipped
            ));
            out
        }
    }
}

fn short_oid(oid: &Oid) -> String {
    short(&oid.to_string()).to_string()
}

fn short(hex: &str) -> &str {
    hex.get(..10).unwrap_or(hex)
}
