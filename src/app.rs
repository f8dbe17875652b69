use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::AppConfig;
use crate::constants::config::CONFIG_FILE;
use crate::error::{CrossError, Result};
use crate::state::AppState;

/// File kinds the dashboard can open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    Csv,
    Bundle,
}

impl OpenKind {
    /// Pick the loader from a path's extension
    pub fn for_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(OpenKind::Csv),
            "zip" | "json" => Ok(OpenKind::Bundle),
            _ => Err(CrossError::UnsupportedFormat { extension }),
        }
    }
}

pub struct CrossOxide {
    pub state: AppState,
    /// Where preference changes are written back
    config_path: PathBuf,
}

impl Default for CrossOxide {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl CrossOxide {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            config_path: PathBuf::from(CONFIG_FILE),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Switch between dark and light mode and remember the choice
    pub fn toggle_theme(&mut self) {
        self.state.config.dark_mode = !self.state.config.dark_mode;
        if let Err(e) = self.state.config.save(&self.config_path) {
            tracing::warn!("Could not save {}: {}", self.config_path.display(), e);
        }
    }

    /// Surface an error in the blocking dialog, passing values through
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.state.ui.show_error(&e);
                None
            }
        }
    }

    /// Open a CSV dataset or a saved bundle
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        match OpenKind::for_path(path)? {
            OpenKind::Csv => self.state.import_csv_file(path)?,
            OpenKind::Bundle => self.state.load_bundle_file(path)?,
        }
        if let Some(name) = path.file_name() {
            self.state
                .ui
                .set_status(format!("Opened {}", name.to_string_lossy()));
        }
        Ok(())
    }

    /// Open a file dropped onto the window. Without a path the dropped
    /// contents are read directly.
    pub fn open_dropped(&mut self, file: &egui::DroppedFile) -> Result<()> {
        if let Some(path) = &file.path {
            return self.open_path(path);
        }
        let Some(bytes) = &file.bytes else {
            return Err(CrossError::FileApiUnavailable(format!(
                "Dropped file '{}' has neither a path nor readable contents.",
                file.name
            )));
        };
        match OpenKind::for_path(Path::new(&file.name))? {
            OpenKind::Csv => self.state.import_csv_str(&String::from_utf8_lossy(bytes))?,
            OpenKind::Bundle => self.state.load_bundle_bytes(&file.name, bytes)?,
        }
        self.state.ui.set_status(format!("Opened {}", file.name));
        Ok(())
    }

    pub fn load_bundle_dialog(&mut self) {
        // Cancelling a dialog is not an error
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Bundles", &["zip", "json"])
            .pick_file()
        {
            let result = self.open_path(&path);
            self.report(result);
        }
    }

    pub fn import_csv_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            let result = self.open_path(&path);
            self.report(result);
        }
    }

    pub fn save_bundle_dialog(&mut self) {
        if let Some(path) = save_path("bundle.zip", "Bundles", &["zip", "json"]) {
            let result = self.state.save_bundle_file(&path);
            if self.report(result).is_some() {
                self.state
                    .ui
                    .set_status(format!("Saved bundle to {}", path.display()));
            }
        }
    }

    pub fn save_selection_dialog(&mut self) {
        if let Some(path) = save_path("selection.csv", "CSV Files", &["csv"]) {
            let result = self.state.save_selection_csv(&path);
            if self.report(result).is_some() {
                self.state
                    .ui
                    .set_status(format!("Exported selection to {}", path.display()));
            }
        }
    }

    pub fn apply_settings(&mut self) {
        let result = self.state.apply_settings_grid();
        if self.report(result).is_some() {
            self.state.ui.set_status("Settings applied");
        }
    }

    pub fn reset_all_filters(&mut self) {
        let result = self.state.reset_all_filters(Instant::now());
        self.report(result);
    }

    /// Run a due bivariate refresh and schedule a repaint for the next one
    pub fn tick(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let result = self.state.tick(now);
        self.report(result);
        if let Some(deadline) = self.state.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

fn save_path(file_name: &str, filter: &str, extensions: &[&str]) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_file_name(file_name)
        .add_filter(filter, extensions)
        .save_file()
}
