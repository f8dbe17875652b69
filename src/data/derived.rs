//! Calendar dimensions derived from the dataset's date column

use super::dataset::{Dataset, series_as_f64, to_millis};
use crate::constants::derived::{HOUR, MONTH, NAMES, WEEKDAY, YEAR, YEAR_MONTH};
use crate::error::{CrossError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;

/// Calendar fields of a single timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    /// Timestamp truncated to the first instant of its month
    pub year_month: NaiveDateTime,
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u32,
    /// 0-23
    pub hour: u32,
}

/// First instant of the month containing `date`
pub fn month_start(date: &NaiveDateTime) -> NaiveDateTime {
    date.date()
        .with_day(1)
        .unwrap_or(date.date())
        .and_time(chrono::NaiveTime::MIN)
}

/// First instant of the month following `date`'s month
pub fn next_month_start(date: &NaiveDateTime) -> NaiveDateTime {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .unwrap_or(*date)
}

/// Split a timestamp into its calendar dimensions
pub fn calendar_parts(date: &NaiveDateTime) -> CalendarParts {
    CalendarParts {
        year_month: month_start(date),
        year: date.year(),
        month: date.month(),
        weekday: date.weekday().num_days_from_sunday(),
        hour: date.hour(),
    }
}

/// The five derived dimension columns, one row per dataset row.
#[derive(Debug, Clone)]
pub struct DerivedDimensions {
    frame: DataFrame,
    /// `[first month, month after the last month]` in epoch milliseconds
    year_month_range: (i64, i64),
}

impl DerivedDimensions {
    /// Derived column names in display order
    pub fn names(&self) -> Vec<String> {
        NAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Get the number of rows
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Column values as f64 (YearMonth as epoch milliseconds)
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| CrossError::ColumnNotFound {
                column: name.to_string(),
            })?;
        series_as_f64(column.as_materialized_series())
    }

    /// X-axis domain of the YearMonth timeline chart
    pub fn year_month_range(&self) -> (i64, i64) {
        self.year_month_range
    }
}

/// Compute the derived dimension table from the dataset's date column
pub fn derive_dimensions(dataset: &Dataset) -> Result<DerivedDimensions> {
    profiling::scope!("derive_dimensions");

    let dates = dataset.dates()?;
    let parts: Vec<CalendarParts> = dates.iter().map(calendar_parts).collect();

    let year_month: Vec<i64> = parts.iter().map(|p| to_millis(&p.year_month)).collect();
    let year: Vec<i32> = parts.iter().map(|p| p.year).collect();
    let month: Vec<i32> = parts.iter().map(|p| p.month as i32).collect();
    let weekday: Vec<i32> = parts.iter().map(|p| p.weekday as i32).collect();
    let hour: Vec<i32> = parts.iter().map(|p| p.hour as i32).collect();

    let year_month_range = match (
        parts.iter().map(|p| p.year_month).min(),
        parts.iter().map(|p| p.year_month).max(),
    ) {
        (Some(first), Some(last)) => (to_millis(&first), to_millis(&next_month_start(&last))),
        _ => (0, 0),
    };

    let frame = DataFrame::new(vec![
        Column::from(
            Series::new(YEAR_MONTH.into(), year_month)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        ),
        Column::from(Series::new(YEAR.into(), year)),
        Column::from(Series::new(MONTH.into(), month)),
        Column::from(Series::new(WEEKDAY.into(), weekday)),
        Column::from(Series::new(HOUR.into(), hour)),
    ])?;

    Ok(DerivedDimensions {
        frame,
        year_month_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_calendar_parts() {
        // 2020-01-06 was a Monday
        let parts = calendar_parts(&dt(2020, 1, 6, 13, 45));
        assert_eq!(parts.year_month, dt(2020, 1, 1, 0, 0));
        assert_eq!(parts.year, 2020);
        assert_eq!(parts.month, 1);
        assert_eq!(parts.weekday, 1);
        assert_eq!(parts.hour, 13);

        // 2023-12-31 was a Sunday
        assert_eq!(calendar_parts(&dt(2023, 12, 31, 0, 0)).weekday, 0);
    }

    #[test]
    fn test_next_month_start_wraps_year() {
        assert_eq!(next_month_start(&dt(2019, 12, 1, 0, 0)), dt(2020, 1, 1, 0, 0));
        assert_eq!(next_month_start(&dt(2020, 2, 1, 0, 0)), dt(2020, 3, 1, 0, 0));
    }

    #[test]
    fn test_derive_dimensions_shape_and_ranges() {
        let dates: Vec<NaiveDateTime> = (0..500)
            .map(|i| dt(2019, 11, 1, 0, 0) + chrono::Duration::hours(i * 7))
            .collect();
        let values = vec![Some(1.0); dates.len()];
        let ds = Dataset::new("Date", &dates, vec![("A".to_string(), values)]).unwrap();

        let derived = derive_dimensions(&ds).unwrap();
        assert_eq!(derived.height(), ds.height());
        assert_eq!(derived.names(), NAMES.to_vec());

        let weekday = derived.column_as_f64(WEEKDAY).unwrap();
        let hour = derived.column_as_f64(HOUR).unwrap();
        let month = derived.column_as_f64(MONTH).unwrap();
        assert!(weekday.iter().all(|&w| (0.0..=6.0).contains(&w)));
        assert!(hour.iter().all(|&h| (0.0..=23.0).contains(&h)));
        assert!(month.iter().all(|&m| (1.0..=12.0).contains(&m)));
    }

    #[test]
    fn test_year_month_range_covers_last_month() {
        let dates = vec![dt(2020, 3, 15, 8, 0), dt(2020, 1, 2, 0, 0)];
        let ds = Dataset::new("Date", &dates, vec![]).unwrap();
        let derived = derive_dimensions(&ds).unwrap();

        let (start, end) = derived.year_month_range();
        assert_eq!(start, to_millis(&dt(2020, 1, 1, 0, 0)));
        assert_eq!(end, to_millis(&dt(2020, 4, 1, 0, 0)));

        let year_month = derived.column_as_f64(YEAR_MONTH).unwrap();
        assert_eq!(year_month[0], to_millis(&dt(2020, 3, 1, 0, 0)) as f64);
    }
}
