//! Subcommands and the config helpers they share.

pub mod convert;
pub mod fields;
pub mod mapping;
pub mod sheets;

use std::path::{Path, PathBuf};

use invsheet_core::models::InvsheetConfig;

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invsheet")
        .join("config.json")
}

/// The `--config` path if given, otherwise the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the config, using defaults when the file does not exist yet.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<InvsheetConfig> {
    Ok(InvsheetConfig::load_or_default(&config_path(explicit))?)
}

/// `path` with ".xlsx" appended unless it already ends in it.
pub fn with_xlsx_extension(path: &Path) -> PathBuf {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".xlsx");
    PathBuf::from(name)
}
