use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::event::DaemonEvent;

/// Polling interval choices offered by the configuration UI.
///
/// Serialized as the plain minute count, so `config.toml` reads
/// `interval_minutes = 30`. Any other value is a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum CheckInterval {
    Min5,
    Min10,
    Min30,
    Min60,
}

impl CheckInterval {
    pub const ALL: [CheckInterval; 4] = [
        CheckInterval::Min5,
        CheckInterval::Min10,
        CheckInterval::Min30,
        CheckInterval::Min60,
    ];

    /// Interval length in minutes.
    pub fn minutes(self) -> u64 {
        match self {
            CheckInterval::Min5 => 5,
            CheckInterval::Min10 => 10,
            CheckInterval::Min30 => 30,
            CheckInterval::Min60 => 60,
        }
    }

    /// Interval length as a [`Duration`], for feeding a tokio ticker.
    pub fn period(self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }
}

impl Default for CheckInterval {
    fn default() -> Self {
        // The UI's initial selection.
        CheckInterval::Min5
    }
}

impl TryFrom<u64> for CheckInterval {
    type Error = String;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        match minutes {
            5 => Ok(CheckInterval::Min5),
            10 => Ok(CheckInterval::Min10),
            30 => Ok(CheckInterval::Min30),
            60 => Ok(CheckInterval::Min60),
            other => Err(format!(
                "invalid interval_minutes {other}: must be one of 5, 10, 30, 60"
            )),
        }
    }
}

impl From<CheckInterval> for u64 {
    fn from(interval: CheckInterval) -> u64 {
        interval.minutes()
    }
}

/// The monitor configuration record. Written by the configuration UI,
/// read fresh by the daemon at every cycle boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Page to fetch each cycle.
    #[serde(default)]
    pub url: String,
    /// Word to look for in the page's visible text (case-insensitive).
    #[serde(default)]
    pub word: String,
    /// How often a check cycle runs while monitoring is on.
    #[serde(default)]
    pub interval_minutes: CheckInterval,
    /// The run flag. `true` means the user has monitoring switched on.
    #[serde(default)]
    pub running: bool,
    /// Where to POST the alert payload. When unset, alerts are logged only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            word: String::new(),
            interval_minutes: CheckInterval::default(),
            running: false,
            webhook_url: None,
        }
    }
}

impl MonitorConfig {
    /// Returns `(url, word)` when both are configured, `None` when either is
    /// empty. A run may not start, and a cycle may not fetch, without both.
    pub fn target(&self) -> Option<(&str, &str)> {
        if self.url.trim().is_empty() || self.word.trim().is_empty() {
            None
        } else {
            Some((self.url.as_str(), self.word.as_str()))
        }
    }

    /// True when `other` describes the same schedule: same target, interval,
    /// and alert destination. The run flag is deliberately excluded — it is
    /// reconciled separately.
    pub fn same_schedule(&self, other: &MonitorConfig) -> bool {
        self.url == other.url
            && self.word == other.word
            && self.interval_minutes == other.interval_minutes
            && self.webhook_url == other.webhook_url
    }
}

/// Loads the config file at `path`, returning `MonitorConfig::default()` if the
/// file does not exist. Returns an error if the file exists but cannot be read
/// or parsed.
pub fn load_or_default(path: &Path) -> Result<MonitorConfig> {
    if !path.exists() {
        return Ok(MonitorConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Serializes `config` to TOML and writes it to `path`, creating the parent
/// directory if needed.
pub fn save(path: &Path, config: &MonitorConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Spawns a file watcher on the parent directory of `path`.  Whenever the config
/// file is created or modified, reloads it and sends a `ConfigReloaded` event.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<DaemonEvent>) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "Failed to create config file watcher");
            return;
        }
    };

    // Watch the parent directory rather than the file directly so we catch
    // editor-style atomic saves (write-new + rename).
    let watch_dir = match path.parent() {
        Some(d) => d.to_path_buf(),
        None => {
            warn!("Config path has no parent directory");
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        warn!(error = %e, "Failed to watch config directory");
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        let affects_config = event.paths.iter().any(|p| p == path.as_path());
        let is_write = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        );

        if affects_config && is_write {
            match load_or_default(&path) {
                Ok(config) => {
                    if tx.send(DaemonEvent::ConfigReloaded(config)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to reload config"),
            }
        }
    }
}
