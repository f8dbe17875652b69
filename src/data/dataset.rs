use crate::constants::derived;
use crate::error::{CrossError, Result};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

/// Milliseconds since the epoch for a wall-clock timestamp
pub fn to_millis(date: &NaiveDateTime) -> i64 {
    date.and_utc().timestamp_millis()
}

/// Wall-clock timestamp for milliseconds since the epoch
pub fn from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Get a column's values as `Vec<f64>`.
/// Nulls become NaN; datetime columns become milliseconds since the epoch.
pub(crate) fn series_as_f64(series: &Series) -> Result<Vec<f64>> {
    match series.dtype() {
        DataType::Datetime(_, _) | DataType::Date => Ok(series_as_millis(series)?
            .into_iter()
            .map(|opt| opt.map(|ms| ms as f64).unwrap_or(f64::NAN))
            .collect()),
        _ => {
            let casted = series.cast(&DataType::Float64)?;
            Ok(casted
                .f64()?
                .into_iter()
                .map(|opt| opt.unwrap_or(f64::NAN))
                .collect())
        }
    }
}

/// Datetime column as milliseconds since the epoch
fn series_as_millis(series: &Series) -> Result<Vec<Option<i64>>> {
    let normalized = series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let physical = normalized.cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

/// Tabular dataset: a date column first, followed by numeric variables.
///
/// Backed by a Polars [`DataFrame`]. The date column is stored as
/// `Datetime(ms)` and every variable as `Float64` with missing values as
/// nulls. A dataset is never mutated after construction; loading new data
/// replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Build a dataset from a date column and named numeric columns
    pub fn new(
        date_name: &str,
        dates: &[NaiveDateTime],
        variables: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let millis: Vec<i64> = dates.iter().map(to_millis).collect();
        let date_series = Series::new(date_name.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut columns = Vec::with_capacity(variables.len() + 1);
        columns.push(Column::from(date_series));
        for (name, values) in variables {
            if values.len() != dates.len() {
                return Err(CrossError::Validation(format!(
                    "column '{}' has {} values but the date column has {}",
                    name,
                    values.len(),
                    dates.len()
                )));
            }
            columns.push(Column::from(Series::new(name.as_str().into(), values)));
        }

        Self::from_frame(DataFrame::new(columns)?)
    }

    /// Wrap an existing frame, coercing it to the dataset layout
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        if frame.width() == 0 {
            return Err(CrossError::EmptyDataset);
        }

        let mut columns = Vec::with_capacity(frame.width());
        for (idx, column) in frame.get_columns().iter().enumerate() {
            let series = column.as_materialized_series();
            let coerced = if idx == 0 {
                if !matches!(series.dtype(), DataType::Datetime(_, _) | DataType::Date) {
                    return Err(CrossError::Validation(format!(
                        "first column '{}' must be a date column, found {}",
                        series.name(),
                        series.dtype()
                    )));
                }
                series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            } else {
                if matches!(series.dtype(), DataType::String | DataType::Boolean) {
                    return Err(CrossError::Validation(format!(
                        "column '{}' must be numeric, found {}",
                        series.name(),
                        series.dtype()
                    )));
                }
                series.cast(&DataType::Float64)?
            };
            columns.push(Column::from(coerced));
        }
        let frame = DataFrame::new(columns)?;

        let dataset = Self { frame };
        dataset.check_reserved_names()?;
        Ok(dataset)
    }

    /// Variable names must not shadow the derived dimension columns
    fn check_reserved_names(&self) -> Result<()> {
        for name in self.variable_names() {
            if derived::NAMES.contains(&name.as_str()) {
                return Err(CrossError::Validation(format!(
                    "column name '{}' is reserved for a derived date dimension",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Get all column names, date column first
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Name of the date column
    pub fn date_name(&self) -> String {
        self.column_names().into_iter().next().unwrap_or_default()
    }

    /// Names of the numeric variable columns
    pub fn variable_names(&self) -> Vec<String> {
        self.column_names().into_iter().skip(1).collect()
    }

    /// Get the number of rows
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Get column values as a Series
    pub fn column_values(&self, col: &str) -> Result<Series> {
        self.frame
            .column(col)
            .map(|c| c.as_materialized_series().clone())
            .map_err(|_| CrossError::ColumnNotFound {
                column: col.to_string(),
            })
    }

    /// Date column as milliseconds since the epoch
    pub fn timestamps(&self) -> Result<Vec<i64>> {
        let series = self.column_values(&self.date_name())?;
        series_as_millis(&series)?
            .into_iter()
            .enumerate()
            .map(|(row, opt)| {
                opt.ok_or_else(|| CrossError::Validation(format!("row {} has no date", row)))
            })
            .collect()
    }

    /// Date column as wall-clock timestamps
    pub fn dates(&self) -> Result<Vec<NaiveDateTime>> {
        self.timestamps()?
            .into_iter()
            .map(|ms| {
                from_millis(ms)
                    .ok_or_else(|| CrossError::Validation(format!("timestamp {} out of range", ms)))
            })
            .collect()
    }

    /// Variable values with missing entries as NaN
    pub fn variable_values(&self, name: &str) -> Result<Vec<f64>> {
        series_as_f64(&self.column_values(name)?)
    }

    /// Variable values with missing entries as `None`
    pub fn variable_options(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.column_values(name)?.cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().collect())
    }

    /// Minimum and maximum over the present values of a variable
    pub fn column_range(&self, name: &str) -> Result<(Option<f64>, Option<f64>)> {
        let series = self.column_values(name)?.cast(&DataType::Float64)?;
        let chunked = series.f64()?;
        Ok((chunked.min(), chunked.max()))
    }

    /// Stringified first `n` rows for the data preview table
    pub fn preview_rows(&self, n: usize) -> Result<Vec<Vec<String>>> {
        let n = n.min(self.height());
        let dates = self.dates()?;
        let variables: Vec<Vec<Option<f64>>> = self
            .variable_names()
            .iter()
            .map(|name| self.variable_options(name))
            .collect::<Result<_>>()?;

        Ok((0..n)
            .map(|row| {
                std::iter::once(dates[row].format("%Y-%m-%d %H:%M:%S").to_string())
                    .chain(variables.iter().map(|col| match col[row] {
                        Some(v) => v.to_string(),
                        None => "NaN".to_string(),
                    }))
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(
            "Date",
            &[date(2020, 1, 1, 0), date(2020, 1, 2, 5), date(2020, 2, 3, 23)],
            vec![
                ("A".to_string(), vec![Some(1.0), Some(4.0), Some(-2.0)]),
                ("B".to_string(), vec![None, Some(10.0), None]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_layout() {
        let ds = sample();
        assert_eq!(ds.height(), 3);
        assert_eq!(ds.date_name(), "Date");
        assert_eq!(ds.variable_names(), vec!["A", "B"]);
        assert!(matches!(
            ds.frame.column("Date").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, _)
        ));
    }

    #[test]
    fn test_dates_round_trip_through_frame() {
        let ds = sample();
        let dates = ds.dates().unwrap();
        assert_eq!(dates[1], date(2020, 1, 2, 5));
        assert_eq!(ds.timestamps().unwrap()[0], to_millis(&date(2020, 1, 1, 0)));
    }

    #[test]
    fn test_missing_values() {
        let ds = sample();
        let b = ds.variable_values("B").unwrap();
        assert!(b[0].is_nan());
        assert_eq!(b[1], 10.0);
        assert_eq!(ds.variable_options("B").unwrap(), vec![None, Some(10.0), None]);
    }

    #[test]
    fn test_column_range_ignores_missing() {
        let ds = sample();
        assert_eq!(ds.column_range("A").unwrap(), (Some(-2.0), Some(4.0)));
        assert_eq!(ds.column_range("B").unwrap(), (Some(10.0), Some(10.0)));
        assert!(matches!(
            ds.column_range("C"),
            Err(CrossError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_reserved_names_rejected() {
        let result = Dataset::new(
            "Date",
            &[date(2020, 1, 1, 0)],
            vec![("Weekday".to_string(), vec![Some(1.0)])],
        );
        assert!(matches!(result, Err(CrossError::Validation(_))));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Dataset::new(
            "Date",
            &[date(2020, 1, 1, 0)],
            vec![("A".to_string(), vec![Some(1.0), Some(2.0)])],
        );
        assert!(matches!(result, Err(CrossError::Validation(_))));
    }

    #[test]
    fn test_preview_rows() {
        let ds = sample();
        let rows = ds.preview_rows(2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2020-01-01 00:00:00", "1", "NaN"]);
    }
}
