//! Packed column-oriented table format used inside bundles
//!
//! ```json
//! { "columns": [ { "name": "Date", "dtype": "date", "values": [1577836800000] },
//!                { "name": "A", "dtype": "number", "values": [1.5, null] } ] }
//! ```

use super::dataset::{Dataset, from_millis};
use crate::error::{CrossError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One packed column. Missing entries are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "lowercase")]
pub enum PackedColumn {
    /// Epoch milliseconds
    Date {
        name: String,
        values: Vec<Option<i64>>,
    },
    Number {
        name: String,
        values: Vec<Option<f64>>,
    },
    String {
        name: String,
        values: Vec<Option<String>>,
    },
}

impl PackedColumn {
    pub fn name(&self) -> &str {
        match self {
            PackedColumn::Date { name, .. }
            | PackedColumn::Number { name, .. }
            | PackedColumn::String { name, .. } => name,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PackedColumn::Date { values, .. } => values.len(),
            PackedColumn::Number { values, .. } => values.len(),
            PackedColumn::String { values, .. } => values.len(),
        }
    }

    fn dtype_name(&self) -> &'static str {
        match self {
            PackedColumn::Date { .. } => "date",
            PackedColumn::Number { .. } => "number",
            PackedColumn::String { .. } => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackedFrame {
    pub columns: Vec<PackedColumn>,
}

impl PackedFrame {
    /// Find a column by name
    pub fn column(&self, name: &str) -> Result<&PackedColumn> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CrossError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Row count; every column must agree
    pub fn height(&self) -> Result<usize> {
        let height = self.columns.first().map(|c| c.len()).unwrap_or(0);
        match self.columns.iter().find(|c| c.len() != height) {
            Some(c) => Err(CrossError::Validation(format!(
                "packed column '{}' has {} values, expected {}",
                c.name(),
                c.len(),
                height
            ))),
            None => Ok(height),
        }
    }

    /// Number column by name
    pub fn numbers(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            PackedColumn::Number { values, .. } => Ok(values),
            other => Err(type_mismatch("number", other)),
        }
    }

    /// String column by name
    pub fn strings(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            PackedColumn::String { values, .. } => Ok(values),
            other => Err(type_mismatch("string", other)),
        }
    }
}

fn type_mismatch(expected: &str, found: &PackedColumn) -> CrossError {
    CrossError::Validation(format!(
        "packed column '{}' should be {}, found {}",
        found.name(),
        expected,
        found.dtype_name()
    ))
}

/// Serialize a dataset into the packed format
pub fn pack_dataset(dataset: &Dataset) -> Result<PackedFrame> {
    let mut columns = vec![PackedColumn::Date {
        name: dataset.date_name(),
        values: dataset.timestamps()?.into_iter().map(Some).collect(),
    }];
    for name in dataset.variable_names() {
        let values = dataset.variable_options(&name)?;
        columns.push(PackedColumn::Number { name, values });
    }
    Ok(PackedFrame { columns })
}

/// Rebuild a dataset from the packed format
pub fn unpack_dataset(packed: &PackedFrame) -> Result<Dataset> {
    packed.height()?;
    let (date_column, variable_columns) = packed
        .columns
        .split_first()
        .ok_or(CrossError::EmptyDataset)?;

    let dates: Vec<NaiveDateTime> = match date_column {
        PackedColumn::Date { values, .. } => values
            .iter()
            .enumerate()
            .map(|(row, ms)| {
                ms.and_then(from_millis).ok_or_else(|| {
                    CrossError::Validation(format!("packed row {} has an invalid date", row))
                })
            })
            .collect::<Result<_>>()?,
        other => return Err(type_mismatch("date", other)),
    };

    let variables = variable_columns
        .iter()
        .map(|column| match column {
            PackedColumn::Number { name, values } => Ok((name.clone(), values.clone())),
            other => Err(type_mismatch("number", other)),
        })
        .collect::<Result<Vec<_>>>()?;

    Dataset::new(date_column.name(), &dates, variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_packed_json_shape() {
        let frame = PackedFrame {
            columns: vec![PackedColumn::Number {
                name: "A".to_string(),
                values: vec![Some(1.5), None],
            }],
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "columns": [{ "dtype": "number", "name": "A", "values": [1.5, null] }]
            })
        );

        let parsed: PackedFrame = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_dataset_pack_unpack() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2021, 5, 4).unwrap().and_hms_opt(3, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 5, 5).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        ];
        let ds = Dataset::new(
            "When",
            &dates,
            vec![("X".to_string(), vec![Some(2.5), None])],
        )
        .unwrap();

        let unpacked = unpack_dataset(&pack_dataset(&ds).unwrap()).unwrap();
        assert_eq!(unpacked.column_names(), vec!["When", "X"]);
        assert_eq!(unpacked.dates().unwrap(), dates);
        assert_eq!(unpacked.variable_options("X").unwrap(), vec![Some(2.5), None]);
    }

    #[test]
    fn test_unpack_rejects_non_date_first_column() {
        let frame = PackedFrame {
            columns: vec![PackedColumn::Number {
                name: "A".to_string(),
                values: vec![Some(1.0)],
            }],
        };
        assert!(matches!(unpack_dataset(&frame), Err(CrossError::Validation(_))));
    }

    #[test]
    fn test_ragged_frame_rejected() {
        let frame = PackedFrame {
            columns: vec![
                PackedColumn::Date {
                    name: "D".to_string(),
                    values: vec![Some(0), Some(1)],
                },
                PackedColumn::Number {
                    name: "A".to_string(),
                    values: vec![Some(1.0)],
                },
            ],
        };
        assert!(frame.height().is_err());
    }
}
