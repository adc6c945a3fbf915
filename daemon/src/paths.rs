/// Canonical file paths for webwatch data files.
///
/// Both files live in the app data directory (see [`app_data_dir`]):
///   - config.toml  Written by the configuration UI (or by hand), read by the daemon.
///   - status.toml  Written by the daemon, read by the UI.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "webwatch";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the webwatch application data directory.
///
/// `$WEBWATCH_DIR` overrides everything (useful for running several instances
/// side by side); otherwise `$XDG_CONFIG_HOME/webwatch`, falling back to
/// `$HOME/.config/webwatch`.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WEBWATCH_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    let home = std::env::var("HOME").expect("HOME environment variable not set");
    PathBuf::from(home).join(".config").join(APP_DIR_NAME)
}

/// Returns the full path to the config file inside [`app_data_dir`].
pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

/// Returns the full path to the status file inside [`app_data_dir`].
pub fn status_file_path() -> PathBuf {
    app_data_dir().join(STATUS_FILE_NAME)
}
