//! Per-variable display settings, editable from the settings grid

use crate::constants::settings_table::{
    COLUMN_NAME, DISPLAY_MAX, DISPLAY_MIN, HEADERS, NAN_SUBSTITUTE,
};
use crate::data::Dataset;
use crate::data::packed::{PackedColumn, PackedFrame};
use crate::error::{CrossError, Result};
use std::collections::BTreeSet;

/// Display settings of one numeric variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSetting {
    pub column: String,
    /// Lower end of the histogram domain (NaN when unknown)
    pub display_min: f64,
    /// Upper end of the histogram domain (NaN when unknown)
    pub display_max: f64,
    /// Value that replaces missing cells before indexing
    pub nan_substitute: f64,
}

/// String form of the settings table as shown in the editable grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsGrid {
    pub rows: Vec<[String; 4]>,
}

impl SettingsGrid {
    pub fn headers() -> [&'static str; 4] {
        HEADERS
    }
}

/// One row per variable column, in dataset order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSettingsTable {
    rows: Vec<VariableSetting>,
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn to_option(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

impl VariableSettingsTable {
    pub fn new(rows: Vec<VariableSetting>) -> Self {
        Self { rows }
    }

    /// Defaults for a fresh dataset: the observed min/max of each column and
    /// a NaN substitute of 0
    pub fn initialize(dataset: &Dataset) -> Result<Self> {
        let rows = dataset
            .variable_names()
            .into_iter()
            .map(|column| {
                let (min, max) = dataset.column_range(&column)?;
                Ok(VariableSetting {
                    column,
                    display_min: min.unwrap_or(f64::NAN),
                    display_max: max.unwrap_or(f64::NAN),
                    nan_substitute: 0.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[VariableSetting] {
        &self.rows
    }

    pub fn get(&self, column: &str) -> Option<&VariableSetting> {
        self.rows.iter().find(|row| row.column == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The set of rows must equal the dataset's variable columns
    pub fn validate_against(&self, dataset: &Dataset) -> Result<()> {
        let expected: BTreeSet<String> = dataset.variable_names().into_iter().collect();
        let actual: BTreeSet<String> = self.rows.iter().map(|r| r.column.clone()).collect();

        if actual.len() != self.rows.len() {
            return Err(CrossError::Validation(
                "variable settings contain duplicate columns".to_string(),
            ));
        }
        if expected != actual {
            let missing: Vec<_> = expected.difference(&actual).cloned().collect();
            let extra: Vec<_> = actual.difference(&expected).cloned().collect();
            return Err(CrossError::Validation(format!(
                "variable settings do not match the dataset (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                extra.join(", ")
            )));
        }
        Ok(())
    }

    /// Render for the editable grid; NaN shows as an empty cell
    pub fn to_grid(&self) -> SettingsGrid {
        SettingsGrid {
            rows: self
                .rows
                .iter()
                .map(|r| {
                    [
                        r.column.clone(),
                        format_cell(r.display_min),
                        format_cell(r.display_max),
                        format_cell(r.nan_substitute),
                    ]
                })
                .collect(),
        }
    }

    /// Read back an edited grid. Editable cells are re-typed to numbers and
    /// anything unparsable becomes NaN.
    pub fn from_grid(grid: &SettingsGrid) -> Self {
        Self {
            rows: grid
                .rows
                .iter()
                .map(|[column, min, max, nan]| VariableSetting {
                    column: column.clone(),
                    display_min: parse_cell(min),
                    display_max: parse_cell(max),
                    nan_substitute: parse_cell(nan),
                })
                .collect(),
        }
    }

    pub fn to_packed(&self) -> PackedFrame {
        let numbers = |name: &str, f: fn(&VariableSetting) -> f64| PackedColumn::Number {
            name: name.to_string(),
            values: self.rows.iter().map(|r| to_option(f(r))).collect(),
        };
        PackedFrame {
            columns: vec![
                PackedColumn::String {
                    name: COLUMN_NAME.to_string(),
                    values: self.rows.iter().map(|r| Some(r.column.clone())).collect(),
                },
                numbers(DISPLAY_MIN, |r| r.display_min),
                numbers(DISPLAY_MAX, |r| r.display_max),
                numbers(NAN_SUBSTITUTE, |r| r.nan_substitute),
            ],
        }
    }

    pub fn from_packed(packed: &PackedFrame) -> Result<Self> {
        let height = packed.height()?;
        let names = packed.strings(COLUMN_NAME)?;
        let mins = packed.numbers(DISPLAY_MIN)?;
        let maxs = packed.numbers(DISPLAY_MAX)?;
        let nans = packed.numbers(NAN_SUBSTITUTE)?;

        let rows = (0..height)
            .map(|i| {
                let column = names[i].clone().ok_or_else(|| {
                    CrossError::Validation(format!("settings row {} has no column name", i))
                })?;
                Ok(VariableSetting {
                    column,
                    display_min: mins[i].unwrap_or(f64::NAN),
                    display_max: maxs[i].unwrap_or(f64::NAN),
                    nan_substitute: nans[i].unwrap_or(f64::NAN),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_dataset() -> Dataset {
        let dates: Vec<_> = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
            .collect();
        Dataset::new(
            "Date",
            &dates,
            vec![
                ("A".to_string(), vec![Some(3.0), Some(-1.0), None]),
                ("B".to_string(), vec![None, None, None]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_initialize() {
        let table = VariableSettingsTable::initialize(&sample_dataset()).unwrap();
        assert_eq!(table.len(), 2);

        let a = table.get("A").unwrap();
        assert_eq!((a.display_min, a.display_max, a.nan_substitute), (-1.0, 3.0, 0.0));

        let b = table.get("B").unwrap();
        assert!(b.display_min.is_nan() && b.display_max.is_nan());
        assert_eq!(b.nan_substitute, 0.0);
    }

    #[test]
    fn test_validate_against() {
        let ds = sample_dataset();
        let table = VariableSettingsTable::initialize(&ds).unwrap();
        assert!(table.validate_against(&ds).is_ok());

        let mut rows = table.rows().to_vec();
        rows.pop();
        assert!(VariableSettingsTable::new(rows.clone()).validate_against(&ds).is_err());

        rows.push(rows[0].clone());
        assert!(VariableSettingsTable::new(rows).validate_against(&ds).is_err());
    }

    #[test]
    fn test_grid_reparse() {
        let mut grid = VariableSettingsTable::initialize(&sample_dataset())
            .unwrap()
            .to_grid();
        assert_eq!(grid.rows[0], ["A", "-1", "3", "0"].map(String::from));
        assert_eq!(grid.rows[1][1], "");

        grid.rows[0][1] = " 0.5 ".to_string();
        grid.rows[0][2] = "lots".to_string();
        let table = VariableSettingsTable::from_grid(&grid);
        let a = table.get("A").unwrap();
        assert_eq!(a.display_min, 0.5);
        assert!(a.display_max.is_nan());
    }

    #[test]
    fn test_packed_columns() {
        let table = VariableSettingsTable::initialize(&sample_dataset()).unwrap();
        let packed = table.to_packed();
        let names: Vec<_> = packed.columns.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, HEADERS.to_vec());
        assert_eq!(packed.numbers(DISPLAY_MIN).unwrap(), &[Some(-1.0), None]);

        let back = VariableSettingsTable::from_packed(&packed).unwrap();
        assert_eq!(back.get("A"), table.get("A"));
        assert!(back.get("B").unwrap().display_max.is_nan());
    }
}
