//! One complete build of the filter index and its chart bindings

use crate::data::{Dataset, DerivedDimensions};
use crate::error::{CrossError, Result};
use crate::filter::{
    Bucketing, DimensionFilter, DimensionId, FilterIndex, GroupId, RecordSet, Selection,
    SelectionScope, extract_selected,
};
use crate::settings::{ChartSettings, DisplaySettingsMap, VariableSettingsTable, compile_display_settings};

/// Monotonic id of a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GenerationId(pub u64);

impl GenerationId {
    pub fn next(self) -> Self {
        GenerationId(self.0 + 1)
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a chart for interaction events. Only valid while its
/// generation is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle {
    pub generation: GenerationId,
    pub dimension: DimensionId,
}

/// A chart bound to its dimension and group
#[derive(Debug, Clone)]
pub struct ChartBinding {
    pub handle: ChartHandle,
    pub group: GroupId,
    pub settings: ChartSettings,
}

/// Record-count readout bound to the shared index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCount {
    pub selected: usize,
    pub total: usize,
}

/// The filter index, its dimensions and groups, and the charts bound to them.
///
/// Dropping a generation releases its groups and dimensions, so a superseded
/// generation never keeps filter state alive.
#[derive(Debug)]
pub struct Generation {
    id: GenerationId,
    index: FilterIndex,
    charts: Vec<ChartBinding>,
    display: DisplaySettingsMap,
}

impl Generation {
    /// Build a generation: records, then one dimension, group and chart per
    /// derived and variable column.
    pub fn build(
        id: GenerationId,
        dataset: &Dataset,
        derived: &DerivedDimensions,
        var_settings: &VariableSettingsTable,
        bins: usize,
    ) -> Result<Self> {
        profiling::scope!("Generation::build");

        let records = RecordSet::compile(dataset, derived, var_settings)?;
        let display = compile_display_settings(derived, var_settings, bins);

        // Constructed up front so an error below still releases what was built
        let mut generation = Self {
            id,
            index: FilterIndex::new(records),
            charts: Vec::with_capacity(display.len()),
            display: DisplaySettingsMap::default(),
        };

        for (column, settings) in display.iter() {
            let dimension = generation.index.dimension(column)?;
            let bucketing = match settings.bucketing {
                Bucketing::Rounded(interval) if interval > 0.0 && interval.is_finite() => {
                    Bucketing::Rounded(interval)
                }
                _ => Bucketing::Exact,
            };
            let group = generation.index.group(dimension, bucketing)?;
            generation.charts.push(ChartBinding {
                handle: ChartHandle {
                    generation: id,
                    dimension,
                },
                group,
                settings: settings.clone(),
            });
        }
        generation.display = display;

        tracing::debug!(
            "Built generation {} with {} charts over {} records",
            id,
            generation.charts.len(),
            generation.index.size()
        );
        Ok(generation)
    }

    pub fn id(&self) -> GenerationId {
        self.id
    }

    pub fn index(&self) -> &FilterIndex {
        &self.index
    }

    pub fn charts(&self) -> &[ChartBinding] {
        &self.charts
    }

    pub fn display_settings(&self) -> &DisplaySettingsMap {
        &self.display
    }

    pub fn data_count(&self) -> DataCount {
        DataCount {
            selected: self.index.selected_count(),
            total: self.index.size(),
        }
    }

    /// Reject handles minted by another generation
    pub fn check_handle(&self, handle: ChartHandle) -> Result<()> {
        if handle.generation != self.id {
            return Err(CrossError::StaleGeneration {
                handle: handle.generation.0,
                current: self.id.0,
            });
        }
        Ok(())
    }

    pub fn chart(&self, handle: ChartHandle) -> Result<&ChartBinding> {
        self.check_handle(handle)?;
        self.charts
            .iter()
            .find(|c| c.handle == handle)
            .ok_or(CrossError::UnknownDimension(handle.dimension.0))
    }

    pub fn chart_for_column(&self, column: &str) -> Option<&ChartBinding> {
        self.charts.iter().find(|c| c.settings.title == column)
    }

    /// Current `(key, count)` values of a chart's group
    pub fn chart_values(&self, handle: ChartHandle) -> Result<Vec<(f64, usize)>> {
        let group = self.chart(handle)?.group;
        self.index.group_values(group)
    }

    pub fn chart_filter(&self, handle: ChartHandle) -> Result<Option<&DimensionFilter>> {
        self.check_handle(handle)?;
        self.index.current_filter(handle.dimension)
    }

    pub fn set_filter(&mut self, handle: ChartHandle, filter: Option<DimensionFilter>) -> Result<()> {
        self.check_handle(handle)?;
        self.index.filter(handle.dimension, filter)
    }

    pub fn reset_all(&mut self) -> Result<()> {
        self.index.filter_all()
    }

    pub fn selection(&self, scope: SelectionScope) -> Result<Selection> {
        extract_selected(&self.index, scope)
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        for chart in &self.charts {
            let _ = self.index.dispose_group(chart.group);
        }
        for chart in &self.charts {
            let _ = self.index.dispose_dimension(chart.handle.dimension);
        }
        tracing::debug!(
            "Disposed generation {} ({} charts)",
            self.id,
            self.charts.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive_dimensions;
    use chrono::NaiveDate;

    fn inputs() -> (Dataset, DerivedDimensions, VariableSettingsTable) {
        let dates: Vec<_> = (0..30)
            .map(|i| {
                NaiveDate::from_ymd_opt(2020, 1, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::hours(i * 13)
            })
            .collect();
        let a: Vec<Option<f64>> = (0..30).map(|i| (i % 4 != 0).then_some(i as f64)).collect();
        let b: Vec<Option<f64>> = (0..30).map(|i| Some(100.0 - i as f64)).collect();
        let ds = Dataset::new(
            "Date",
            &dates,
            vec![("A".to_string(), a), ("B".to_string(), b)],
        )
        .unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let table = VariableSettingsTable::initialize(&ds).unwrap();
        (ds, derived, table)
    }

    #[test]
    fn test_one_chart_per_column() {
        let (ds, derived, table) = inputs();
        let generation = Generation::build(GenerationId(1), &ds, &derived, &table, 40).unwrap();

        let titles: Vec<_> = generation
            .charts()
            .iter()
            .map(|c| c.settings.title.as_str())
            .collect();
        assert_eq!(titles, vec!["YearMonth", "Year", "Month", "Weekday", "Hour", "A", "B"]);
        assert_eq!(generation.index().dimension_count(), 7);
        assert_eq!(generation.index().group_count(), 7);
        assert_eq!(generation.data_count(), DataCount { selected: 30, total: 30 });
    }

    #[test]
    fn test_rebuild_yields_identical_totals() {
        let (ds, derived, table) = inputs();
        let totals = |g: &Generation| -> Vec<usize> {
            g.charts()
                .iter()
                .map(|c| g.chart_values(c.handle).unwrap().iter().map(|v| v.1).sum())
                .collect()
        };

        let first = Generation::build(GenerationId(1), &ds, &derived, &table, 40).unwrap();
        let first_totals = totals(&first);
        drop(first);
        let second = Generation::build(GenerationId(2), &ds, &derived, &table, 40).unwrap();

        assert_eq!(first_totals, totals(&second));
        assert!(first_totals.iter().all(|&t| t == 30));
    }

    #[test]
    fn test_stale_handle_rejected() {
        let (ds, derived, table) = inputs();
        let old = Generation::build(GenerationId(1), &ds, &derived, &table, 40).unwrap();
        let stale = old.charts()[0].handle;
        drop(old);

        let mut current = Generation::build(GenerationId(2), &ds, &derived, &table, 40).unwrap();
        assert!(matches!(
            current.set_filter(stale, Some(DimensionFilter::Exact(1.0))),
            Err(CrossError::StaleGeneration { handle: 1, current: 2 })
        ));
        assert_eq!(current.data_count().selected, 30);
    }

    #[test]
    fn test_variable_groups_are_bucketed() {
        let (ds, derived, table) = inputs();
        let generation = Generation::build(GenerationId(1), &ds, &derived, &table, 40).unwrap();
        let b = generation.chart_for_column("B").unwrap();
        assert!(matches!(b.settings.bucketing, Bucketing::Rounded(i) if i > 0.0));
        let weekday = generation.chart_for_column("Weekday").unwrap();
        assert_eq!(weekday.settings.bucketing, Bucketing::Exact);
    }

    #[test]
    fn test_filter_through_handle() {
        let (ds, derived, table) = inputs();
        let mut generation = Generation::build(GenerationId(3), &ds, &derived, &table, 40).unwrap();
        let weekday = generation.chart_for_column("Weekday").unwrap().handle;
        generation
            .set_filter(weekday, Some(DimensionFilter::Exact(1.0)))
            .unwrap();

        let selection = generation.selection(SelectionScope::All).unwrap();
        assert!(!selection.is_empty());
        assert!(selection.field("Weekday").unwrap().iter().all(|&w| w == 1.0));
        assert_eq!(generation.data_count().selected, selection.len());

        generation.reset_all().unwrap();
        assert_eq!(generation.data_count().selected, 30);
    }
}
