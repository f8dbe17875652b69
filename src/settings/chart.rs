//! Per-dimension chart settings (DisplaySettings)

use super::buckets::resolve_buckets;
use super::variable::VariableSettingsTable;
use crate::constants::chart::*;
use crate::constants::derived::{HOUR, MONTH, WEEKDAY, YEAR, YEAR_MONTH};
use crate::data::DerivedDimensions;
use crate::filter::Bucketing;

/// How a bar chart lays out its x axis
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    /// Epoch milliseconds, bars one calendar month wide
    Time { range: (i64, i64) },
    /// Plain numbers
    Linear { range: (f64, f64) },
}

impl XScale {
    /// Axis range as plot coordinates
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            XScale::Time { range } => (range.0 as f64, range.1 as f64),
            XScale::Linear { range } => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarConfig {
    pub x_scale: XScale,
    /// Pixels between bars; negative values overlap neighbours
    pub gap: f32,
    /// Bars centred on their key instead of starting at it
    pub center_bar: bool,
    /// Show the brushed range next to the title
    pub show_range: bool,
    pub y_ticks: usize,
    /// Explicit x tick positions
    pub x_tick_values: Option<Vec<f64>>,
    /// Data-space width of one bar
    pub bar_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieConfig {
    pub radius: f32,
    pub inner_radius: f32,
    pub min_angle_for_label: f32,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            radius: PIE_RADIUS,
            inner_radius: PIE_INNER_RADIUS,
            min_angle_for_label: PIE_MIN_ANGLE_FOR_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowConfig {
    /// Label per key, indexed by the key's integer value
    pub labels: Option<Vec<String>>,
    /// Row colours cycled by position
    pub colors: Vec<(u8, u8, u8)>,
    pub label_offset_y: f32,
}

impl RowConfig {
    /// Display label for a group key
    pub fn label_for(&self, key: f64) -> String {
        self.labels
            .as_ref()
            .and_then(|labels| {
                (key >= 0.0 && key.fract() == 0.0)
                    .then(|| labels.get(key as usize))
                    .flatten()
            })
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Chart type with its type-specific configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Bar(BarConfig),
    Pie(PieConfig),
    Row(RowConfig),
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar(_) => "bar",
            ChartKind::Pie(_) => "pie",
            ChartKind::Row(_) => "row",
        }
    }
}

/// Everything needed to build and draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub kind: ChartKind,
    pub bucketing: Bucketing,
}

impl ChartSettings {
    fn new(title: &str, kind: ChartKind) -> Self {
        Self {
            title: title.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            kind,
            bucketing: Bucketing::Exact,
        }
    }
}

/// Chart settings keyed by column, derived columns first then variables
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplaySettingsMap {
    entries: Vec<(String, ChartSettings)>,
}

impl DisplaySettingsMap {
    pub fn get(&self, column: &str) -> Option<&ChartSettings> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, settings)| settings)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChartSettings)> {
        self.entries.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn columns(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, column: &str, settings: ChartSettings) {
        self.entries.push((column.to_string(), settings));
    }
}

fn linear_bar(range: (f64, f64), bar_width: f64) -> BarConfig {
    BarConfig {
        x_scale: XScale::Linear { range },
        gap: 0.0,
        center_bar: false,
        show_range: false,
        y_ticks: DEFAULT_Y_TICKS,
        x_tick_values: None,
        bar_width,
    }
}

/// Fixed settings of the five date-derived charts
pub fn derived_chart_settings(derived: &DerivedDimensions) -> Vec<(String, ChartSettings)> {
    let (month_lo, month_hi) = derived.year_month_range();
    let year_month = ChartSettings {
        width: TIMELINE_WIDTH,
        height: TIMELINE_HEIGHT,
        ..ChartSettings::new(
            YEAR_MONTH,
            ChartKind::Bar(BarConfig {
                x_scale: XScale::Time {
                    range: (month_lo, month_hi),
                },
                gap: 1.0,
                show_range: true,
                y_ticks: 3,
                // Roughly one month, in milliseconds
                bar_width: 28.0 * 86_400_000.0,
                ..linear_bar((0.0, 1.0), 1.0)
            }),
        )
    };

    let weekday = ChartKind::Row(RowConfig {
        labels: Some(WEEKDAYS.iter().map(|s| s.to_string()).collect()),
        colors: WEEKDAY_COLORS.to_vec(),
        label_offset_y: ROW_LABEL_OFFSET_Y,
    });

    let hour = ChartKind::Bar(BarConfig {
        x_tick_values: Some((0..=24).step_by(4).map(f64::from).collect()),
        ..linear_bar((0.0, 24.0), 1.0)
    });

    vec![
        (YEAR_MONTH.to_string(), year_month),
        (YEAR.to_string(), ChartSettings::new(YEAR, ChartKind::Pie(PieConfig::default()))),
        (MONTH.to_string(), ChartSettings::new(MONTH, ChartKind::Pie(PieConfig::default()))),
        (WEEKDAY.to_string(), ChartSettings::new(WEEKDAY, weekday)),
        (HOUR.to_string(), ChartSettings::new(HOUR, hour)),
    ]
}

/// Histogram settings for one numeric variable
pub fn variable_chart_settings(column: &str, min: f64, max: f64, bins: usize) -> ChartSettings {
    let buckets = resolve_buckets(min, max, bins);
    let mut settings = ChartSettings::new(
        column,
        ChartKind::Bar(BarConfig {
            gap: -1.0,
            center_bar: true,
            ..linear_bar(buckets.extent, buckets.interval)
        }),
    );
    settings.bucketing = Bucketing::Rounded(buckets.interval);
    settings
}

/// Compile settings for every chart: derived columns then variables, in
/// settings-table order
pub fn compile_display_settings(
    derived: &DerivedDimensions,
    var_settings: &VariableSettingsTable,
    bins: usize,
) -> DisplaySettingsMap {
    profiling::scope!("compile_display_settings");

    let mut map = DisplaySettingsMap::default();
    for (column, settings) in derived_chart_settings(derived) {
        map.push(&column, settings);
    }
    for row in var_settings.rows() {
        map.push(
            &row.column,
            variable_chart_settings(&row.column, row.display_min, row.display_max, bins),
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, derive_dimensions};
    use chrono::NaiveDate;

    fn fixture() -> (DerivedDimensions, VariableSettingsTable) {
        let dates: Vec<_> = (0..48)
            .map(|h| {
                NaiveDate::from_ymd_opt(2020, 1, 30)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::hours(h)
            })
            .collect();
        let values: Vec<Option<f64>> = (0..48).map(|i| Some(i as f64 * 0.5)).collect();
        let ds = Dataset::new("Date", &dates, vec![("Load".to_string(), values)]).unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let table = VariableSettingsTable::initialize(&ds).unwrap();
        (derived, table)
    }

    #[test]
    fn test_chart_kinds_and_order() {
        let (derived, table) = fixture();
        let map = compile_display_settings(&derived, &table, 40);

        assert_eq!(
            map.columns(),
            vec!["YearMonth", "Year", "Month", "Weekday", "Hour", "Load"]
        );
        let kinds: Vec<_> = map.iter().map(|(_, s)| s.kind.name()).collect();
        assert_eq!(kinds, vec!["bar", "pie", "pie", "row", "bar", "bar"]);
    }

    #[test]
    fn test_year_month_timeline() {
        let (derived, table) = fixture();
        let map = compile_display_settings(&derived, &table, 40);
        let settings = map.get("YearMonth").unwrap();
        assert_eq!((settings.width, settings.height), (729.0, 100.0));
        assert_eq!(settings.bucketing, Bucketing::Exact);

        let ChartKind::Bar(bar) = &settings.kind else {
            panic!("YearMonth should be a bar chart");
        };
        assert!(bar.show_range);
        assert_eq!(bar.y_ticks, 3);
        // Both days fall in January 2020; the axis ends at February 1st
        let (lo, hi) = bar.x_scale.bounds();
        assert_eq!(lo, 1_577_836_800_000.0);
        assert_eq!(hi, 1_580_515_200_000.0);
    }

    #[test]
    fn test_hour_ticks_and_weekday_labels() {
        let (derived, table) = fixture();
        let map = compile_display_settings(&derived, &table, 40);

        let ChartKind::Bar(hour) = &map.get("Hour").unwrap().kind else {
            panic!("Hour should be a bar chart");
        };
        assert_eq!(hour.x_scale.bounds(), (0.0, 24.0));
        assert_eq!(
            hour.x_tick_values.as_deref(),
            Some(&[0.0, 4.0, 8.0, 12.0, 16.0, 20.0, 24.0][..])
        );

        let ChartKind::Row(row) = &map.get("Weekday").unwrap().kind else {
            panic!("Weekday should be a row chart");
        };
        assert_eq!(row.label_for(1.0), "Mon");
        assert_eq!(row.label_for(9.0), "9");
        assert_eq!(row.colors.len(), 7);
    }

    #[test]
    fn test_variable_histogram() {
        let settings = variable_chart_settings("Load", 0.0, 23.5, 40);
        assert_eq!(settings.bucketing, Bucketing::Rounded(0.5));
        let ChartKind::Bar(bar) = &settings.kind else {
            panic!("variables should be bar charts");
        };
        assert_eq!(bar.gap, -1.0);
        assert!(bar.center_bar);
        assert_eq!(bar.x_scale.bounds(), (0.0, 23.5));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let (derived, table) = fixture();
        assert_eq!(
            compile_display_settings(&derived, &table, 40),
            compile_display_settings(&derived, &table, 40)
        );
    }
}
