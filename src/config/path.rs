//! Module for locating the TabletPlumber config file

use std::path::PathBuf;

/// Name of the driver config file inside the config directory
pub const CONFIG_FILE_NAME: &str = "driver.cfg";

/// System fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/etc/tabletplumber";

/// Returns the directory configuration is stored in
/// (e.g. "~/.config/tabletplumber")
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("tabletplumber") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    base_dirs.get_config_home()
}

/// Returns the path of the driver config file
/// (e.g. "~/.config/tabletplumber/driver.cfg")
pub fn get_config_path() -> PathBuf {
    get_base_path().join(CONFIG_FILE_NAME)
}
