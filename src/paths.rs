//! XDG directory helpers for config and log locations.

use std::path::PathBuf;

/// User configuration directory.
///
/// Uses `GRAFT_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/graft`
/// or `~/.config/graft`.
pub(crate) fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GRAFT_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("graft")
}

/// Default directory for file logging when none is configured.
///
/// `$XDG_STATE_HOME/graft/logs` or `~/.local/state/graft/logs`.
pub(crate) fn log_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("state")
        })
        .join("graft")
        .join("logs")
}
