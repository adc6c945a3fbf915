mod alert;
mod config;
mod cycle;
mod event;
mod fetcher;
mod matcher;
mod paths;
mod scheduler;
mod status;
mod store;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::store::ConfigStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webwatch_daemon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        error!(dir = %app_dir.display(), error = %e, "Failed to create app data directory");
        std::process::exit(1);
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let initial_config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Config unreadable, using defaults");
        config::MonitorConfig::default()
    });
    let store = ConfigStore::new(config_path.clone());

    let (event_tx, mut event_rx) = mpsc::channel::<event::DaemonEvent>(32);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, event_tx.clone()));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(event::DaemonEvent::Shutdown).await;
            }
        });
    }

    info!(version = env!("CARGO_PKG_VERSION"), "webwatch-daemon started");

    let mut scheduler = scheduler::Scheduler::new(store, paths::status_file_path());

    // The run flag is durable: a monitor left running survives a daemon restart.
    if initial_config.running {
        if let Err(e) = scheduler.start(&initial_config).await {
            warn!(error = %e, "Could not resume monitoring from saved config");
        }
    }
    let mut last_config = initial_config;

    // ── Event loop ────────────────────────────────────────────────────────────
    // Reconciles the config file's run flag against the scheduler: flag on
    // starts (or restarts on a schedule change), flag off stops.
    while let Some(evt) = event_rx.recv().await {
        match evt {
            event::DaemonEvent::ConfigReloaded(new_config) => {
                if new_config.running {
                    let needs_restart =
                        !scheduler.is_running() || !new_config.same_schedule(&last_config);
                    if needs_restart {
                        if let Err(e) = scheduler.start(&new_config).await {
                            warn!(error = %e, "Could not start monitoring");
                        }
                    }
                } else if scheduler.is_running() {
                    if let Err(e) = scheduler.stop().await {
                        warn!(error = %e, "Could not stop monitoring cleanly");
                    }
                }
                last_config = new_config;
            }

            event::DaemonEvent::Shutdown => {
                info!("Shutting down");
                scheduler.shutdown().await;
                break;
            }
        }
    }
}
