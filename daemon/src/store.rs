//! Read-through accessor over the durable config file.
//!
//! The run flag lives in `config.toml`, not in daemon memory: a check cycle
//! consults the store fresh at each boundary so a stop issued by the UI (or a
//! hand edit) between schedule and tick, or during a fetch, is observed before
//! any alert is sent.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::{self, MonitorConfig};

/// Handle on the durable configuration record.
///
/// Cheap to clone; every read goes back to disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current config from disk. A missing file yields the default
    /// (stopped) config.
    pub fn load(&self) -> Result<MonitorConfig> {
        config::load_or_default(&self.path)
    }

    /// Writes `config` back to disk.
    pub fn save(&self, config: &MonitorConfig) -> Result<()> {
        config::save(&self.path, config)
    }

    /// Read-modify-write of the run flag only.
    pub fn set_running(&self, running: bool) -> Result<()> {
        let mut config = self.load()?;
        config.running = running;
        self.save(&config)
    }

    /// Fresh read of the run flag. An unreadable or unparsable config counts
    /// as stopped: when the flag is uncertain the cycle must not alert.
    pub fn is_running(&self) -> bool {
        self.load().map(|c| c.running).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckInterval;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.toml"))
    }

    #[test]
    fn load_missing_file_is_default_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = store.load().unwrap();
        assert!(!config.running);
        assert!(!store.is_running());
    }

    #[test]
    fn set_running_persists_and_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let config = MonitorConfig {
            url: "http://example.test".to_string(),
            word: "vip".to_string(),
            interval_minutes: CheckInterval::Min10,
            running: false,
            webhook_url: None,
        };
        store.save(&config).unwrap();

        store.set_running(true).unwrap();
        let reloaded = store.load().unwrap();
        assert!(reloaded.running);
        assert_eq!(reloaded.url, "http://example.test");
        assert_eq!(reloaded.interval_minutes, CheckInterval::Min10);

        store.set_running(false).unwrap();
        assert!(!store.is_running());
    }

    #[test]
    fn reads_observe_external_rewrite() {
        // Simulates the UI rewriting config.toml while a run is scheduled.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        std::fs::write(store.path(), "running = true\n").unwrap();
        assert!(store.is_running());

        std::fs::write(store.path(), "running = false\n").unwrap();
        assert!(!store.is_running());
    }

    #[test]
    fn unreadable_config_counts_as_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "running = ][[ nope").unwrap();
        assert!(!store.is_running());
    }
}
