//! Provenance ledger: the structured record embedded in destination
//! commit messages.
//!
//! Wire format, line oriented:
//! - first line is the sentinel `graft`, followed by a blank separator;
//! - sections are introduced by key lines that exactly match `repo:`,
//!   `hash:`, `files:` or `rename:`;
//! - data lines are indented by two spaces: `name:url` under `repo:`,
//!   a hex object id under `hash:`, `sourcePath:destinationPath` pairs
//!   under `files:`, a single `oldPath:newPath` under `rename:`;
//! - free text may follow the structured sections and is ignored.
//!
//! Commit messages are the only persisted state this tool has, so the
//! codec never consults anything but the message text. A message whose
//! first line is not the sentinel carries no provenance and decodes to
//! `None`; a message that claims the sentinel but breaks the section
//! grammar is an error, never a silent skip.

use git2::Oid;
use thiserror::Error;

/// First line of every ledger-bearing commit message.
pub const SENTINEL: &str = "graft";

const INDENT: &str = "  ";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("remote line is not name:url: {0:?}")]
    MalformedRemote(String),
    #[error("invalid upstream hash {0:?}: {1}")]
    InvalidHash(String, #[source] git2::Error),
    #[error("files line is not source:destination: {0:?}")]
    MalformedFiles(String),
    #[error("rename line is not old:new: {0:?}")]
    MalformedRename(String),
    #[error("record carries a second rename pair: {0:?}")]
    DuplicateRename(String),
    #[error("record carries both files and rename sections")]
    ConflictingSections,
    #[error("rename section has no data line")]
    EmptyRename,
    #[error("record has no hash section")]
    MissingHash,
}

/// One remote of the source repository, as configured at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    pub name: String,
    pub url: String,
}

impl RemoteSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Payload of a record: what the commit did to tracked paths.
///
/// Exactly one kind per record. `Files` establishes or refreshes
/// source→destination pairs; `Rename` moves an already tracked
/// destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEntries {
    Files(Vec<(String, String)>),
    Rename { old: String, new: String },
}

/// A decoded ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRecord {
    /// Remotes of the source repository when the commit was made.
    pub remotes: Vec<RemoteSpec>,
    /// The exact source commit the tracked content was taken from.
    pub upstream: Oid,
    pub entries: RecordEntries,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Key {
    Repo,
    Hash,
    Files,
    Rename,
}

fn parse_key(line: &str) -> Option<Key> {
    match line {
        "repo:" => Some(Key::Repo),
        "hash:" => Some(Key::Hash),
        "files:" => Some(Key::Files),
        "rename:" => Some(Key::Rename),
        _ => None,
    }
}

/// Splits a data line on its only `:`. Used for `files:` and `rename:`
/// lines, where a second separator means the line is ambiguous.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Some((a, b)),
        _ => None,
    }
}

impl ProvenanceRecord {
    pub fn new(remotes: Vec<RemoteSpec>, upstream: Oid, entries: RecordEntries) -> Self {
        Self {
            remotes,
            upstream,
            entries,
        }
    }

    /// Renders the record as a commit message.
    ///
    /// Section order is fixed: repo, hash, then files or rename.
    pub fn encode(&self) -> String {
        let mut msg = String::new();
        msg.push_str(SENTINEL);
        msg.push_str("\n\n");

        msg.push_str("repo:\n");
        for remote in &self.remotes {
            msg.push_str(INDENT);
            msg.push_str(&remote.name);
            msg.push(':');
            msg.push_str(&remote.url);
            msg.push('\n');
        }

        msg.push_str("hash:\n");
        msg.push_str(INDENT);
        msg.push_str(&self.upstream.to_string());
        msg.push('\n');

        match &self.entries {
            RecordEntries::Files(pairs) => {
                msg.push_str("files:\n");
                for (src, dst) in pairs {
                    msg.push_str(INDENT);
                    msg.push_str(src);
                    msg.push(':');
                    msg.push_str(dst);
                    msg.push('\n');
                }
            }
            RecordEntries::Rename { old, new } => {
                msg.push_str("rename:\n");
                msg.push_str(INDENT);
                msg.push_str(old);
                msg.push(':');
                msg.push_str(new);
                msg.push('\n');
            }
        }

        msg
    }

    /// Parses a commit message. `Ok(None)` when the message carries no
    /// record at all (missing sentinel, or fewer than 3 lines).
    ///
    /// Structured parsing stops at the first non-indented line after a
    /// section has begun, so a regular commit body may trail the
    /// record. Lines before the first key line are ignored.
    pub fn decode(message: &str) -> Result<Option<Self>, LedgerError> {
        let lines: Vec<&str> = message.trim().lines().collect();
        if lines.len() < 3 {
            return Ok(None);
        }
        if lines[0].trim() != SENTINEL {
            return Ok(None);
        }

        let mut remotes = Vec::new();
        let mut upstream: Option<Oid> = None;
        let mut files: Vec<(String, String)> = Vec::new();
        let mut rename: Option<(String, String)> = None;
        let mut files_seen = false;
        let mut rename_seen = false;
        let mut active: Option<Key> = None;

        for raw in &lines[1..] {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(key) = parse_key(line) {
                match key {
                    Key::Files => files_seen = true,
                    Key::Rename => rename_seen = true,
                    _ => {}
                }
                active = Some(key);
                continue;
            }
            let Some(key) = active else {
                // Text before any section is not part of the record.
                continue;
            };
            if !raw.starts_with(' ') && !raw.starts_with('\t') {
                // Normal commit body has begun.
                break;
            }
            match key {
                Key::Repo => {
                    let (name, url) = line
                        .split_once(':')
                        .ok_or_else(|| LedgerError::MalformedRemote(line.to_string()))?;
                    remotes.push(RemoteSpec::new(name, url));
                }
                Key::Hash => {
                    upstream = Some(
                        Oid::from_str(line)
                            .map_err(|e| LedgerError::InvalidHash(line.to_string(), e))?,
                    );
                }
                Key::Files => {
                    let (src, dst) = split_pair(line)
                        .ok_or_else(|| LedgerError::MalformedFiles(line.to_string()))?;
                    files.push((src.to_string(), dst.to_string()));
                }
                Key::Rename => {
                    if rename.is_some() {
                        return Err(LedgerError::DuplicateRename(line.to_string()));
                    }
                    let (old, new) = split_pair(line)
                        .ok_or_else(|| LedgerError::MalformedRename(line.to_string()))?;
                    rename = Some((old.to_string(), new.to_string()));
                }
            }
        }

        if files_seen && rename_seen {
            return Err(LedgerError::ConflictingSections);
        }
        let entries = if rename_seen {
            let (old, new) = rename.ok_or(LedgerError::EmptyRename)?;
            RecordEntries::Rename { old, new }
        } else {
            RecordEntries::Files(files)
        };
        let upstream = upstream.ok_or(LedgerError::MissingHash)?;

        Ok(Some(Self {
            remotes,
            upstream,
            entries,
        }))
    }
}
