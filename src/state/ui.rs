//! UI interaction state

use super::generation::ChartHandle;
use crate::error::CrossError;
use crate::settings::SettingsGrid;

/// Tab shown in the side panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePanel {
    #[default]
    Settings,
    Preview,
}

/// A blocking error dialog
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDialog {
    pub title: String,
    pub message: String,
}

/// Stringified head of the dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// An in-progress drag on a bar chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub handle: ChartHandle,
    pub start: f64,
    pub current: f64,
}

impl Brush {
    /// Ordered `(lo, hi)` of the brushed span
    pub fn span(&self) -> (f64, f64) {
        if self.start <= self.current {
            (self.start, self.current)
        } else {
            (self.current, self.start)
        }
    }
}

/// UI state: dialogs, the editable settings grid and cached tables
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub active_panel: ActivePanel,

    /// Error to show in the blocking dialog
    pub error_dialog: Option<ErrorDialog>,

    /// Transient status line message
    pub status: Option<String>,

    /// Editable copy of the variable settings table
    pub settings_grid: SettingsGrid,

    /// Whether the grid has unapplied edits
    pub settings_dirty: bool,

    /// Cached data preview
    pub preview: Option<DataPreview>,

    pub brush: Option<Brush>,

    /// Keyboard shortcut help window
    pub show_help: bool,

    /// Data version counter (increments on load)
    pub data_version: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-dataset caches after new data was loaded
    pub fn on_data_loaded(&mut self, preview: DataPreview, grid: SettingsGrid) {
        self.data_version += 1;
        self.preview = Some(preview);
        self.settings_grid = grid;
        self.settings_dirty = false;
        self.brush = None;
    }

    /// Show an error in the blocking dialog
    pub fn show_error(&mut self, error: &CrossError) {
        tracing::error!("{}", error);
        self.error_dialog = Some(ErrorDialog {
            title: error.title().to_string(),
            message: error.user_message(),
        });
    }

    pub fn clear_error(&mut self) {
        self.error_dialog = None;
    }

    pub fn has_error(&self) -> bool {
        self.error_dialog.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_error_uses_user_message() {
        let mut ui = UiState::new();
        ui.show_error(&CrossError::MalformedBundle("somethingElse".to_string()));
        let dialog = ui.error_dialog.clone().unwrap();
        assert_eq!(dialog.title, "Invalid Bundle");
        assert!(dialog.message.contains("somethingElse"));

        ui.clear_error();
        assert!(!ui.has_error());
    }

    #[test]
    fn test_data_loaded_resets_caches() {
        let mut ui = UiState::new();
        ui.settings_dirty = true;
        ui.on_data_loaded(DataPreview::default(), SettingsGrid::default());
        assert_eq!(ui.data_version, 1);
        assert!(!ui.settings_dirty);
        assert!(ui.preview.is_some());
    }
}
