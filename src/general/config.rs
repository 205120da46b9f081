use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use xio_extract::io::{CsvExporter, TimestampFormat};
use xio_extract::{Error, Result};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "xio-extract.json";

static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub timestamp_format: TimestampFormat,
    /// Stem of the per-segment settings CSV
    pub settings_file: String,
    pub skip_empty_datagrams: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timestamp_format: TimestampFormat::Raw,
            settings_file: "settings".to_string(),
            skip_empty_datagrams: false,
            debug: false,
        }
    }
}

impl Config {
    pub fn exporter(&self) -> CsvExporter {
        CsvExporter::new()
            .timestamps(self.timestamp_format)
            .settings_name(self.settings_file.clone())
    }
}

/// Load `path`, or `xio-extract.json` if present, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !local.exists() {
                return Ok(Config::default());
            }
            local
        }
    };
    let text = fs::read_to_string(&path)?;
    serde_json::from_str(&text).map_err(|source| Error::Config { path, source })
}

/// First call wins; later calls are ignored.
pub fn set_config(config: Config) {
    let _ = CONFIG.set(config);
}

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
