//! One check cycle: fetch → match → maybe-alert, with run-flag boundary
//! checks and cooperative cancellation.
//!
//! The run flag is read fresh from the durable store at both boundaries so a
//! stop issued between schedule and tick, or while the fetch is in flight,
//! suppresses the alert. Cancellation takes precedence over a completed fetch.

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::alert::{AlertSink, ALERT_BODY, ALERT_TITLE};
use crate::fetcher::{FetchError, PageFetcher};
use crate::matcher;
use crate::store::ConfigStore;

/// What a completed cycle observed. Transient — nothing is persisted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub matched: bool,
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// url or word absent — no retry until the config is fixed and a new
    /// start is issued.
    #[error("url or word not configured")]
    ConfigMissing,
    /// Network/HTTP failure — absorbed; the next tick retries naturally.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The run flag flipped to stopped, or stop() cancelled the cycle.
    /// A benign outcome, not an error to surface.
    #[error("cycle cancelled")]
    Cancelled,
}

/// Runs a single check cycle.
///
/// Never panics and never alters the run flag: failures are returned for the
/// scheduler to absorb, and only a match that survives the post-fetch flag
/// re-check reaches the alert sink.
pub async fn run_cycle(
    store: &ConfigStore,
    fetcher: &PageFetcher,
    sink: &dyn AlertSink,
    cancel: &mut watch::Receiver<bool>,
) -> Result<CycleReport, CycleError> {
    // Stop may have happened between schedule and tick.
    if *cancel.borrow() || !store.is_running() {
        return Err(CycleError::Cancelled);
    }

    let config = store.load().map_err(|_| CycleError::ConfigMissing)?;
    let (url, word) = config.target().ok_or(CycleError::ConfigMissing)?;

    // Race the fetch against the cancellation signal: stop() must not have
    // to wait out a slow network call.
    let text = tokio::select! {
        result = fetcher.fetch_text(url) => result?,
        _ = cancel.changed() => {
            debug!("Cycle cancelled during fetch");
            return Err(CycleError::Cancelled);
        }
    };

    // The flag may have flipped while the fetch was in flight; a stale match
    // must not produce an alert after the user pressed stop.
    if *cancel.borrow() || !store.is_running() {
        return Err(CycleError::Cancelled);
    }

    let matched = matcher::matches(&text, word);
    if matched {
        info!(word, url, "Word found");
        if let Err(e) = sink.notify(ALERT_TITLE, ALERT_BODY).await {
            debug!(error = %e, "Alert delivery failed");
        }
    }

    Ok(CycleReport { matched })
}
