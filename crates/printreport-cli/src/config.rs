use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const OUTPUT_DIR_ENV: &str = "PRINTREPORT_OUTPUT_DIR";
const DEFAULT_SHEET_NAME: &str = "Printer Report";
const DEFAULT_ANONYMOUS_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory for exported workbooks. Falls back to the working directory.
    pub output_dir: Option<PathBuf>,
    pub sheet_name: String,
    /// Shown in the Users panel for jobs logged under `?`.
    pub anonymous_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            anonymous_label: DEFAULT_ANONYMOUS_LABEL.to_string(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("printreport").join("settings.toml"))
    }

    /// Load settings. An explicit path must exist and parse; the default
    /// location is optional and silently falls back to defaults.
    /// Priority for the output directory: PRINTREPORT_OUTPUT_DIR > file > default.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::config_path()
                .filter(|path| path.exists())
                .map(|path| Self::load_from(&path))
                .transpose()?
                .unwrap_or_default(),
        };

        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                settings.output_dir = Some(PathBuf::from(dir));
            }
        }

        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// `--output` wins over the configured directory.
    pub fn output_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
