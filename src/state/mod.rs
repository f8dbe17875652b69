//! Application state management
//!
//! [`AppState`] owns the loaded bundle, the current filter-index generation
//! and the bivariate view. Every UI action maps to one entry point here.

mod bivariate;
mod generation;
mod scheduler;
mod ui;

pub use bivariate::{BivariateMode, BivariatePlot, BivariateView};
pub use generation::{ChartBinding, ChartHandle, DataCount, Generation, GenerationId};
pub use scheduler::CoalescingScheduler;
pub use ui::{ActivePanel, Brush, DataPreview, UiState};

use crate::config::AppConfig;
use crate::data::bundle::{self, DataBundle};
use crate::data::{DerivedDimensions, csv_io, derive_dimensions};
use crate::error::{CrossError, Result};
use crate::filter::{DimensionFilter, GroupKey, SelectionScope};
use crate::settings::VariableSettingsTable;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

/// Main application state container
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset and settings
    bundle: Option<DataBundle>,

    /// Calendar dimensions of the loaded dataset
    derived: Option<DerivedDimensions>,

    /// Current filter index generation
    generation: Option<Generation>,

    /// Id of the most recently built generation
    last_generation: GenerationId,

    pub bivariate: BivariateView,

    /// Debounced bivariate refreshes, tagged with the generation they target
    bivariate_refresh: CoalescingScheduler<GenerationId>,

    pub ui: UiState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            bivariate: BivariateView::new(config.bivariate_visible),
            bivariate_refresh: CoalescingScheduler::new(config.debounce()),
            config,
            bundle: None,
            derived: None,
            generation: None,
            last_generation: GenerationId::default(),
            ui: UiState::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.bundle.is_some()
    }

    pub fn bundle(&self) -> Option<&DataBundle> {
        self.bundle.as_ref()
    }

    pub fn generation(&self) -> Option<&Generation> {
        self.generation.as_ref()
    }

    pub fn charts(&self) -> &[ChartBinding] {
        self.generation
            .as_ref()
            .map(|g| g.charts())
            .unwrap_or_default()
    }

    pub fn data_count(&self) -> Option<DataCount> {
        self.generation.as_ref().map(Generation::data_count)
    }

    /// Names of the numeric variables of the loaded dataset
    pub fn variable_names(&self) -> Vec<String> {
        self.bundle
            .as_ref()
            .map(|b| b.dataset.variable_names())
            .unwrap_or_default()
    }

    fn current(&self) -> Result<&Generation> {
        self.generation
            .as_ref()
            .ok_or_else(|| CrossError::Validation("no data loaded".to_string()))
    }

    fn current_mut(&mut self) -> Result<&mut Generation> {
        self.generation
            .as_mut()
            .ok_or_else(|| CrossError::Validation("no data loaded".to_string()))
    }

    // ----- Loading -----

    /// Replace the loaded data and rebuild everything from it
    pub fn set_data_bundle(&mut self, data_bundle: DataBundle) -> Result<()> {
        profiling::scope!("AppState::set_data_bundle");

        // Checks that can fail happen before any state is replaced
        data_bundle
            .settings
            .var_settings
            .validate_against(&data_bundle.dataset)?;
        let derived = derive_dimensions(&data_bundle.dataset)?;
        let preview = DataPreview {
            headers: data_bundle.dataset.column_names(),
            rows: data_bundle.dataset.preview_rows(self.config.preview_rows)?,
        };
        self.install_bundle(data_bundle, derived, preview)
    }

    /// Swap in a validated bundle. The new generation is built before any
    /// other state changes; if that fails the previous bundle is rebuilt.
    fn install_bundle(
        &mut self,
        data_bundle: DataBundle,
        derived: DerivedDimensions,
        preview: DataPreview,
    ) -> Result<()> {
        self.dispose_generation();
        let id = self.last_generation.next();
        let built = Generation::build(
            id,
            &data_bundle.dataset,
            &derived,
            &data_bundle.settings.var_settings,
            self.config.num_hist_bins,
        );
        let generation = match built {
            Ok(generation) => generation,
            Err(e) => {
                if let Err(restore) = self.rebuild() {
                    tracing::error!("Could not rebuild the previous data: {}", restore);
                }
                return Err(e);
            }
        };
        self.last_generation = id;

        self.ui
            .on_data_loaded(preview, data_bundle.settings.var_settings.to_grid());
        self.bivariate.reconcile_axes(&data_bundle.dataset.variable_names());
        tracing::info!(
            "Loaded dataset: {} rows, {} variables",
            data_bundle.dataset.height(),
            data_bundle.settings.var_settings.len()
        );
        self.bundle = Some(data_bundle);
        self.derived = Some(derived);
        self.generation = Some(generation);

        self.refresh_bivariate()
    }

    /// Import a CSV document as a new dataset with default settings
    pub fn import_csv_str(&mut self, text: &str) -> Result<()> {
        let started = Instant::now();
        let dataset = csv_io::parse_csv_str(text)?;
        self.set_data_bundle(DataBundle::from_dataset(dataset)?)?;
        tracing::info!("Loaded data in {:.1} seconds", started.elapsed().as_secs_f64());
        Ok(())
    }

    pub fn import_csv_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.import_csv_str(&text)
    }

    /// Load bundle contents named `.zip` or `.json`. On failure the current
    /// state is left as it was.
    pub fn load_bundle_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let data_bundle = bundle::read_bundle_bytes(name, bytes)?;
        self.set_data_bundle(data_bundle)
    }

    /// Load a bundle file (`.zip` or JSON-wrapped `.json`)
    pub fn load_bundle_file(&mut self, path: &Path) -> Result<()> {
        let data_bundle = bundle::load_bundle_file(path)?;
        self.set_data_bundle(data_bundle)
    }

    // ----- Settings -----

    /// Store new variable settings and rebuild the charts
    pub fn apply_settings(&mut self, table: VariableSettingsTable) -> Result<()> {
        let data_bundle = self
            .bundle
            .as_mut()
            .ok_or_else(|| CrossError::Validation("no data loaded".to_string()))?;
        table.validate_against(&data_bundle.dataset)?;

        self.ui.settings_grid = table.to_grid();
        self.ui.settings_dirty = false;
        data_bundle.settings.var_settings = table;
        tracing::info!("Applied variable settings");

        self.rebuild()?;
        self.refresh_bivariate()
    }

    /// Apply whatever is currently in the editable grid
    pub fn apply_settings_grid(&mut self) -> Result<()> {
        let table = VariableSettingsTable::from_grid(&self.ui.settings_grid);
        self.apply_settings(table)
    }

    /// Dispose the current generation, then build the next one.
    ///
    /// The old generation is gone before the new one exists, on every path.
    pub fn rebuild(&mut self) -> Result<()> {
        self.dispose_generation();

        let (Some(data_bundle), Some(derived)) = (&self.bundle, &self.derived) else {
            return Ok(());
        };
        self.last_generation = self.last_generation.next();
        let generation = Generation::build(
            self.last_generation,
            &data_bundle.dataset,
            derived,
            &data_bundle.settings.var_settings,
            self.config.num_hist_bins,
        )?;
        self.generation = Some(generation);
        Ok(())
    }

    /// Drop the current generation along with anything that refers to it
    fn dispose_generation(&mut self) {
        if let Some(old) = self.generation.take() {
            drop(old);
        }
        self.bivariate_refresh.cancel();
        self.ui.brush = None;
    }

    // ----- Chart interaction -----

    /// Set or clear one chart's filter
    pub fn filter_chart(
        &mut self,
        handle: ChartHandle,
        filter: Option<DimensionFilter>,
        now: Instant,
    ) -> Result<()> {
        self.current_mut()?.set_filter(handle, filter)?;
        self.on_filter_changed(now);
        Ok(())
    }

    /// Toggle one key of a pie or row chart's key filter
    pub fn toggle_chart_key(&mut self, handle: ChartHandle, key: f64, now: Instant) -> Result<()> {
        let mut keys = match self.current()?.chart_filter(handle)? {
            Some(DimensionFilter::Keys(keys)) => keys.clone(),
            Some(DimensionFilter::Exact(v)) => BTreeSet::from([GroupKey(*v)]),
            _ => BTreeSet::new(),
        };
        if !keys.remove(&GroupKey(key)) {
            keys.insert(GroupKey(key));
        }
        let filter = (!keys.is_empty()).then_some(DimensionFilter::Keys(keys));
        self.filter_chart(handle, filter, now)
    }

    pub fn reset_chart(&mut self, handle: ChartHandle, now: Instant) -> Result<()> {
        self.filter_chart(handle, None, now)
    }

    pub fn reset_all_filters(&mut self, now: Instant) -> Result<()> {
        self.current_mut()?.reset_all()?;
        self.on_filter_changed(now);
        Ok(())
    }

    /// Debounce a bivariate refresh, or remember to refresh once shown again
    fn on_filter_changed(&mut self, now: Instant) {
        if !self.bivariate.visible {
            self.bivariate.mark_stale();
            return;
        }
        if let Some(generation) = &self.generation {
            self.bivariate_refresh.schedule(generation.id(), now);
        }
    }

    // ----- Bivariate view -----

    fn refresh_bivariate(&mut self) -> Result<()> {
        match &self.generation {
            Some(generation) => self.bivariate.refresh(generation),
            None => {
                self.bivariate.clear();
                Ok(())
            }
        }
    }

    pub fn set_bivariate_axes(&mut self, x: String, y: String) -> Result<()> {
        self.bivariate.x = Some(x);
        self.bivariate.y = Some(y);
        self.refresh_bivariate()
    }

    pub fn set_bivariate_mode(&mut self, mode: BivariateMode) -> Result<()> {
        self.bivariate.mode = mode;
        self.refresh_bivariate()
    }

    pub fn set_bivariate_visible(&mut self, visible: bool) -> Result<()> {
        let was_visible = self.bivariate.visible;
        self.bivariate.visible = visible;
        if !visible {
            if self.bivariate_refresh.cancel().is_some() {
                self.bivariate.mark_stale();
            }
            return Ok(());
        }
        if !was_visible && self.bivariate.is_stale() {
            return self.refresh_bivariate();
        }
        Ok(())
    }

    /// Run a debounced refresh if one is due. Returns whether it ran.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        let Some(target) = self.bivariate_refresh.poll(now) else {
            return Ok(false);
        };
        let current = self.generation.as_ref().map(Generation::id);
        if current != Some(target) || !self.bivariate.visible {
            return Ok(false);
        }
        self.refresh_bivariate()?;
        Ok(true)
    }

    /// When the next debounced refresh is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.bivariate_refresh.deadline()
    }

    // ----- Export -----

    /// The loaded bundle as a zip archive
    pub fn save_bundle_bytes(&self) -> Result<Vec<u8>> {
        let data_bundle = self
            .bundle
            .as_ref()
            .ok_or_else(|| CrossError::Validation("no data loaded".to_string()))?;
        bundle::write_bundle_zip(data_bundle)
    }

    /// Apply the grid's pending edits, then save the bundle
    pub fn save_bundle_file(&mut self, path: &Path) -> Result<()> {
        if self.ui.settings_dirty {
            self.apply_settings_grid()?;
        }
        let data_bundle = self
            .bundle
            .as_ref()
            .ok_or_else(|| CrossError::Validation("no data loaded".to_string()))?;
        bundle::save_bundle_file(data_bundle, path)
    }

    /// The currently selected records as CSV
    pub fn selection_csv(&self) -> Result<String> {
        let selection = self.current()?.selection(SelectionScope::All)?;
        csv_io::selection_to_csv(&selection)
    }

    pub fn save_selection_csv(&self, path: &Path) -> Result<()> {
        let selection = self.current()?.selection(SelectionScope::All)?;
        csv_io::write_selection_csv(&selection, path)?;
        tracing::info!("Exported {} records to {}", selection.len(), path.display());
        Ok(())
    }

    /// Head of the dataset as strings
    pub fn data_preview(&self) -> Option<&DataPreview> {
        self.ui.preview.as_ref()
    }
}
