//! Extraction of the records that currently pass the filters

use super::index::{DimensionId, FilterIndex};
use super::records::ColumnKind;
use crate::error::Result;

/// Which filters a selection observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionScope {
    /// Every active filter
    All,
    /// Every active filter except this dimension's
    ExceptDimension(DimensionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRecord {
    /// Position in the index
    pub row: usize,
    pub values: Vec<f64>,
}

/// Selected records with their column names and kinds
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    names: Vec<String>,
    kinds: Vec<ColumnKind>,
    records: Vec<SelectedRecord>,
}

impl Selection {
    pub fn new(names: Vec<String>, kinds: Vec<ColumnKind>, records: Vec<SelectedRecord>) -> Self {
        Self {
            names,
            kinds,
            records,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn records(&self) -> &[SelectedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One field of every selected record
    pub fn field(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.records.iter().map(|r| r.values[idx]).collect())
    }
}

/// Collect the records passing the scope's filters, in index order.
///
/// Always computed from the live filter state.
pub fn extract_selected(index: &FilterIndex, scope: SelectionScope) -> Result<Selection> {
    profiling::scope!("extract_selected");

    let records = index.records();
    let mut selected = Vec::new();
    for row in 0..records.len() {
        let passes = match scope {
            SelectionScope::All => index.passes_all(row),
            SelectionScope::ExceptDimension(id) => index.passes_except(row, id)?,
        };
        if passes {
            selected.push(SelectedRecord {
                row,
                values: records.record(row),
            });
        }
    }

    Ok(Selection::new(records.names(), records.kinds(), selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, derive_dimensions};
    use crate::filter::{DimensionFilter, RecordSet};
    use crate::settings::VariableSettingsTable;
    use chrono::NaiveDate;

    fn index() -> FilterIndex {
        // 2020-01-05 was a Sunday
        let dates: Vec<_> = (0..10)
            .map(|i| {
                NaiveDate::from_ymd_opt(2020, 1, 5)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i)
            })
            .collect();
        let values: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let ds = Dataset::new("Date", &dates, vec![("V".to_string(), values)]).unwrap();
        let derived = derive_dimensions(&ds).unwrap();
        let table = VariableSettingsTable::initialize(&ds).unwrap();
        FilterIndex::new(RecordSet::compile(&ds, &derived, &table).unwrap())
    }

    #[test]
    fn test_unfiltered_selects_everything() {
        let ndx = index();
        let selection = extract_selected(&ndx, SelectionScope::All).unwrap();
        assert_eq!(selection.len(), 10);
        assert_eq!(selection.names()[0], "Date");
        assert_eq!(selection.field("V").unwrap()[9], 9.0);
    }

    #[test]
    fn test_reflects_current_filters() {
        let mut ndx = index();
        let weekday = ndx.dimension("Weekday").unwrap();
        ndx.filter(weekday, Some(DimensionFilter::Exact(1.0))).unwrap();

        let selection = extract_selected(&ndx, SelectionScope::All).unwrap();
        assert_eq!(selection.field("Weekday").unwrap(), vec![1.0, 1.0]);
        assert_eq!(selection.field("V").unwrap(), vec![1.0, 8.0]);

        ndx.filter(weekday, None).unwrap();
        assert_eq!(extract_selected(&ndx, SelectionScope::All).unwrap().len(), 10);
    }

    #[test]
    fn test_except_dimension_scope() {
        let mut ndx = index();
        let weekday = ndx.dimension("Weekday").unwrap();
        let v = ndx.dimension("V").unwrap();
        ndx.filter(weekday, Some(DimensionFilter::Exact(1.0))).unwrap();
        ndx.filter(v, Some(DimensionFilter::Range { lo: 0.0, hi: 5.0 }))
            .unwrap();

        let all = extract_selected(&ndx, SelectionScope::All).unwrap();
        assert_eq!(all.field("V").unwrap(), vec![1.0]);

        let except_v = extract_selected(&ndx, SelectionScope::ExceptDimension(v)).unwrap();
        assert_eq!(except_v.field("V").unwrap(), vec![1.0, 8.0]);
    }
}
