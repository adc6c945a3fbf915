use crate::config::MonitorConfig;

pub enum DaemonEvent {
    /// The config file changed on disk and was successfully re-parsed.
    /// The main loop reconciles the run flag against the scheduler.
    ConfigReloaded(MonitorConfig),
    /// Ctrl+C received; the daemon should cancel any run and exit.
    Shutdown,
}
