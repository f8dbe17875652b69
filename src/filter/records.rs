//! The transformed record set the filter index is built over

use crate::constants::derived::{DATE_RECORD, NAMES};
use crate::data::{Dataset, DerivedDimensions};
use crate::error::{CrossError, Result};
use crate::settings::VariableSettingsTable;

/// How a record field is rendered outside the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Epoch milliseconds
    Date,
    Numeric,
}

#[derive(Debug, Clone)]
pub struct RecordColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<f64>,
}

/// Record name of the date column. A header that collides with a derived
/// column gives way to it; the date then goes by `Date`, suffixed until unique.
fn date_record_name(dataset: &Dataset) -> String {
    let header = dataset.date_name();
    if !NAMES.contains(&header.as_str()) {
        return header;
    }
    let variables = dataset.variable_names();
    let taken = |name: &str| NAMES.contains(&name) || variables.iter().any(|v| v == name);
    let mut name = DATE_RECORD.to_string();
    let mut suffix = 1;
    while taken(&name) {
        name = format!("{}_{}", DATE_RECORD, suffix);
        suffix += 1;
    }
    name
}

/// Column-major records: the date column, the derived columns, then the
/// variable columns with missing values replaced by their NaN substitute.
#[derive(Debug, Clone)]
pub struct RecordSet {
    columns: Vec<RecordColumn>,
    len: usize,
}

impl RecordSet {
    /// Build records from the dataset, its derived dimensions and the current
    /// variable settings
    pub fn compile(
        dataset: &Dataset,
        derived: &DerivedDimensions,
        var_settings: &VariableSettingsTable,
    ) -> Result<Self> {
        profiling::scope!("RecordSet::compile");

        let len = dataset.height();
        let mut columns = Vec::with_capacity(1 + derived.names().len() + var_settings.len());

        columns.push(RecordColumn {
            name: date_record_name(dataset),
            kind: ColumnKind::Date,
            values: dataset.timestamps()?.into_iter().map(|ms| ms as f64).collect(),
        });

        for (idx, name) in derived.names().into_iter().enumerate() {
            let values = derived.column_as_f64(&name)?;
            // YearMonth is the only date-typed derived column
            let kind = if idx == 0 {
                ColumnKind::Date
            } else {
                ColumnKind::Numeric
            };
            columns.push(RecordColumn { name, kind, values });
        }

        for name in dataset.variable_names() {
            let substitute = var_settings
                .get(&name)
                .map(|row| row.nan_substitute)
                .ok_or_else(|| CrossError::Validation(format!("no settings for column '{}'", name)))?;
            let values = dataset
                .variable_options(&name)?
                .into_iter()
                .map(|v| v.unwrap_or(substitute))
                .collect();
            columns.push(RecordColumn {
                name,
                kind: ColumnKind::Numeric,
                values,
            });
        }

        if let Some(bad) = columns.iter().find(|c| c.values.len() != len) {
            return Err(CrossError::Validation(format!(
                "column '{}' has {} records, expected {}",
                bad.name,
                bad.values.len(),
                len
            )));
        }

        Ok(Self { columns, len })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, idx: usize) -> Option<&RecordColumn> {
        self.columns.get(idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn kinds(&self) -> Vec<ColumnKind> {
        self.columns.iter().map(|c| c.kind).collect()
    }

    /// All fields of one record, in column order
    pub fn record(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c.values[row]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive_dimensions;
    use chrono::NaiveDate;

    #[test]
    fn test_compile_layout_and_substitution() {
        let dates: Vec<_> = (6..=8)
            .map(|d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap().and_hms_opt(9, 0, 0).unwrap())
            .collect();
        let ds = Dataset::new(
            "Timestamp",
            &dates,
            vec![("A".to_string(), vec![Some(1.0), None, Some(3.0)])],
        )
        .unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let mut table = VariableSettingsTable::initialize(&ds).unwrap();

        let records = RecordSet::compile(&ds, &derived, &table).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.names(),
            vec!["Timestamp", "YearMonth", "Year", "Month", "Weekday", "Hour", "A"]
        );
        assert_eq!(records.kinds()[1], ColumnKind::Date);
        assert_eq!(records.kinds()[6], ColumnKind::Numeric);
        assert_eq!(records.column(6).unwrap().values, vec![1.0, 0.0, 3.0]);
        // 2020-01-06 was a Monday
        assert_eq!(records.record(0)[4], 1.0);

        let mut grid = table.to_grid();
        grid.rows[0][3] = "-99".to_string();
        table = VariableSettingsTable::from_grid(&grid);
        let records = RecordSet::compile(&ds, &derived, &table).unwrap();
        assert_eq!(records.column(6).unwrap().values[1], -99.0);
    }

    #[test]
    fn test_missing_settings_row() {
        let dates = vec![NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()];
        let ds = Dataset::new("Date", &dates, vec![("A".to_string(), vec![None])]).unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let empty = VariableSettingsTable::default();
        assert!(RecordSet::compile(&ds, &derived, &empty).is_err());
    }

    #[test]
    fn test_date_header_colliding_with_derived_name() {
        let dates = vec![NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(3, 0, 0).unwrap()];
        let ds = Dataset::new("Hour", &dates, vec![("Date".to_string(), vec![Some(1.0)])]).unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let table = VariableSettingsTable::initialize(&ds).unwrap();

        let records = RecordSet::compile(&ds, &derived, &table).unwrap();
        assert_eq!(
            records.names(),
            vec!["Date_1", "YearMonth", "Year", "Month", "Weekday", "Hour", "Date"]
        );
        let hour = records.column_index("Hour").unwrap();
        assert_eq!(records.column(hour).unwrap().values, vec![3.0]);
    }
}
