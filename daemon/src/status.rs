use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Whether monitoring is currently scheduled.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Outcome of the most recent check cycle.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum LastOutcome {
    Matched,
    NoMatch,
    Failed,
}

/// Runtime status written by the daemon to status.toml.
/// The configuration UI reads this file (read-only) to display daemon state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DaemonStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// Current monitoring state.
    pub state: MonitorState,
    /// RFC 3339 timestamp of the most recently completed check cycle, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
    /// Outcome of the most recently completed check cycle, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<LastOutcome>,
    /// Human-readable error message if the last cycle failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonStatus {
    /// Constructs the initial stopped status on daemon startup.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: MonitorState::Stopped,
            last_check: None,
            last_outcome: None,
            error: None,
        }
    }

    /// Records a completed cycle: timestamp now, the given outcome, and the
    /// error text for failed cycles.
    pub fn record_cycle(&mut self, outcome: LastOutcome, error: Option<String>) {
        self.last_check = Some(chrono::Local::now().to_rfc3339());
        self.last_outcome = Some(outcome);
        self.error = error;
    }
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors rather than panicking — a status write failure should never
/// crash the daemon.
pub fn write_status(path: &Path, status: &DaemonStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(error = %e, dir = %parent.display(), "Failed to create status directory");
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!(error = %e, "Failed to write status file");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize status"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DaemonStatus::new ─────────────────────────────────────────────────────

    #[test]
    fn new_starts_stopped() {
        let s = DaemonStatus::new();
        assert_eq!(s.state, MonitorState::Stopped);
        assert!(s.last_check.is_none());
        assert!(s.last_outcome.is_none());
        assert!(s.error.is_none());
    }

    #[test]
    fn new_version_matches_cargo_pkg() {
        let s = DaemonStatus::new();
        assert_eq!(s.version, env!("CARGO_PKG_VERSION"));
    }

    // ── record_cycle ──────────────────────────────────────────────────────────

    #[test]
    fn record_cycle_sets_timestamp_and_outcome() {
        let mut s = DaemonStatus::new();
        s.record_cycle(LastOutcome::Matched, None);
        assert!(s.last_check.is_some());
        assert_eq!(s.last_outcome, Some(LastOutcome::Matched));
        assert!(s.error.is_none());
    }

    #[test]
    fn record_cycle_failure_keeps_error_until_next_cycle() {
        let mut s = DaemonStatus::new();
        s.record_cycle(LastOutcome::Failed, Some("connection refused".to_string()));
        assert_eq!(s.last_outcome, Some(LastOutcome::Failed));
        assert_eq!(s.error.as_deref(), Some("connection refused"));

        s.record_cycle(LastOutcome::NoMatch, None);
        assert_eq!(s.last_outcome, Some(LastOutcome::NoMatch));
        assert!(s.error.is_none());
    }

    // ── serialization ─────────────────────────────────────────────────────────

    #[test]
    fn state_serializes_to_lowercase() {
        let mut s = DaemonStatus::new();
        let stopped = toml::to_string_pretty(&s).unwrap();
        assert!(stopped.contains("state = \"stopped\""));

        s.state = MonitorState::Running;
        let running = toml::to_string_pretty(&s).unwrap();
        assert!(running.contains("state = \"running\""));
    }

    #[test]
    fn status_round_trips_through_toml() {
        let mut status = DaemonStatus::new();
        status.state = MonitorState::Running;
        status.record_cycle(LastOutcome::NoMatch, None);

        let serialized = toml::to_string_pretty(&status).unwrap();
        let deserialized: DaemonStatus = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.state, MonitorState::Running);
        assert_eq!(deserialized.last_outcome, Some(LastOutcome::NoMatch));
    }

    // ── write_status ──────────────────────────────────────────────────────────

    #[test]
    fn write_status_creates_file_and_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.toml");
        write_status(&path, &DaemonStatus::new());
        assert!(path.exists());
    }

    #[test]
    fn write_status_omits_none_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");
        write_status(&path, &DaemonStatus::new());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("last_check"));
        assert!(!content.contains("last_outcome"));
        assert!(!content.contains("error"));
    }

    #[test]
    fn write_status_includes_populated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");

        let mut status = DaemonStatus::new();
        status.state = MonitorState::Running;
        status.record_cycle(LastOutcome::Failed, Some("HTTP 503".to_string()));
        write_status(&path, &status);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("last_check"));
        assert!(content.contains("last_outcome = \"failed\""));
        assert!(content.contains("HTTP 503"));
    }
}
