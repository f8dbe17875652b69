//! Dashboard configuration loaded from `cross-oxide.json`

use crate::constants::{histogram, preview, timing};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// User-tunable settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target bucket count for numeric histograms
    pub num_hist_bins: usize,

    /// Debounce window for bivariate refreshes triggered by filtering
    pub ui_debounce_millis: u64,

    /// Rows shown in the data preview table
    pub preview_rows: usize,

    /// Whether the bivariate view starts expanded
    pub bivariate_visible: bool,

    /// Dark mode theme toggle
    pub dark_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_hist_bins: histogram::NUM_HIST_BINS,
            ui_debounce_millis: timing::UI_DEBOUNCE_MILLIS,
            preview_rows: preview::DATA_PREVIEW_NUM_ROWS,
            bivariate_visible: true,
            dark_mode: true,
        }
    }
}

impl AppConfig {
    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&contents)?;
        config.validate();
        Ok(config)
    }

    /// Read a config file if present, falling back to defaults on any problem
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring configuration {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.ui_debounce_millis)
    }

    /// Clamp values that would make the dashboard unusable
    pub fn validate(&mut self) {
        self.num_hist_bins = self.num_hist_bins.clamp(2, 500);
        self.preview_rows = self.preview_rows.max(1);
    }
}
