//! Multidimensional filter index with crossfilter semantics.
//!
//! Each dimension views one record column and may carry one filter. A group
//! counts records per key over its dimension, seeing every filter except its
//! own dimension's, so the chart being brushed keeps showing its full
//! distribution while all other charts narrow.
//!
//! A per-record rejection counter (how many dimension filters reject the
//! record) makes "passes all" and "passes all but one" O(1) checks.

use super::records::RecordSet;
use crate::error::{CrossError, Result};
use crate::settings::round_to;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

/// A totally ordered f64 group key
#[derive(Debug, Clone, Copy)]
pub struct GroupKey(pub f64);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// How a group maps values to keys
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bucketing {
    Exact,
    /// Nearest multiple of the interval
    Rounded(f64),
}

impl Bucketing {
    pub fn key(&self, value: f64) -> f64 {
        match *self {
            Bucketing::Exact => value,
            Bucketing::Rounded(interval) => round_to(value, interval),
        }
    }
}

/// A filter on one dimension's raw values
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionFilter {
    Exact(f64),
    /// `lo <= v < hi`
    Range { lo: f64, hi: f64 },
    /// Any of the listed values
    Keys(BTreeSet<GroupKey>),
}

impl DimensionFilter {
    pub fn matches(&self, value: f64) -> bool {
        match self {
            DimensionFilter::Exact(v) => GroupKey(*v) == GroupKey(value),
            DimensionFilter::Range { lo, hi } => *lo <= value && value < *hi,
            DimensionFilter::Keys(keys) => keys.contains(&GroupKey(value)),
        }
    }
}

#[derive(Debug)]
struct Dimension {
    column: usize,
    filter: Option<DimensionFilter>,
    /// Whether each record passes this dimension's filter
    passes: Vec<bool>,
}

#[derive(Debug)]
struct Group {
    dimension: DimensionId,
    bucketing: Bucketing,
}

/// The shared index every chart of a generation filters through
#[derive(Debug)]
pub struct FilterIndex {
    records: RecordSet,
    dimensions: Vec<Option<Dimension>>,
    groups: Vec<Option<Group>>,
    rejections: Vec<u32>,
}

impl FilterIndex {
    pub fn new(records: RecordSet) -> Self {
        let len = records.len();
        Self {
            records,
            dimensions: Vec::new(),
            groups: Vec::new(),
            rejections: vec![0; len],
        }
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Total number of records
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Create a dimension over the named column
    pub fn dimension(&mut self, column: &str) -> Result<DimensionId> {
        let column = self
            .records
            .column_index(column)
            .ok_or_else(|| CrossError::ColumnNotFound {
                column: column.to_string(),
            })?;
        self.dimensions.push(Some(Dimension {
            column,
            filter: None,
            passes: vec![true; self.records.len()],
        }));
        Ok(DimensionId(self.dimensions.len() - 1))
    }

    /// Create a count group over a dimension
    pub fn group(&mut self, dimension: DimensionId, bucketing: Bucketing) -> Result<GroupId> {
        self.dim(dimension)?;
        self.groups.push(Some(Group {
            dimension,
            bucketing,
        }));
        Ok(GroupId(self.groups.len() - 1))
    }

    fn dim(&self, id: DimensionId) -> Result<&Dimension> {
        self.dimensions
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(CrossError::UnknownDimension(id.0))
    }

    fn grp(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(CrossError::UnknownGroup(id.0))
    }

    /// Current filter of a dimension
    pub fn current_filter(&self, id: DimensionId) -> Result<Option<&DimensionFilter>> {
        Ok(self.dim(id)?.filter.as_ref())
    }

    /// Replace a dimension's filter; `None` clears it
    pub fn filter(&mut self, id: DimensionId, filter: Option<DimensionFilter>) -> Result<()> {
        let column = self.dim(id)?.column;
        let values = &self
            .records
            .column(column)
            .ok_or(CrossError::UnknownDimension(id.0))?
            .values;
        let dimension = self.dimensions[id.0]
            .as_mut()
            .ok_or(CrossError::UnknownDimension(id.0))?;

        for (row, &value) in values.iter().enumerate() {
            let now = filter.as_ref().is_none_or(|f| f.matches(value));
            let before = dimension.passes[row];
            if before && !now {
                self.rejections[row] += 1;
            } else if !before && now {
                self.rejections[row] -= 1;
            }
            dimension.passes[row] = now;
        }
        dimension.filter = filter;
        Ok(())
    }

    /// Clear every dimension's filter
    pub fn filter_all(&mut self) -> Result<()> {
        let ids: Vec<DimensionId> = self.live_dimensions().collect();
        for id in ids {
            self.filter(id, None)?;
        }
        Ok(())
    }

    fn live_dimensions(&self) -> impl Iterator<Item = DimensionId> + '_ {
        self.dimensions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some())
            .map(|(i, _)| DimensionId(i))
    }

    /// Whether any dimension carries a filter
    pub fn has_filters(&self) -> bool {
        self.dimensions.iter().flatten().any(|d| d.filter.is_some())
    }

    /// Record passes every active filter
    pub fn passes_all(&self, row: usize) -> bool {
        self.rejections[row] == 0
    }

    /// Record passes every active filter except possibly the given dimension's
    pub fn passes_except(&self, row: usize, id: DimensionId) -> Result<bool> {
        let dimension = self.dim(id)?;
        Ok(self.passes_except_dim(row, dimension))
    }

    fn passes_except_dim(&self, row: usize, dimension: &Dimension) -> bool {
        match self.rejections[row] {
            0 => true,
            1 => !dimension.passes[row],
            _ => false,
        }
    }

    /// `(key, count)` pairs sorted by key. Every key present in the data is
    /// listed, with a count of zero when all its records are filtered out.
    pub fn group_values(&self, id: GroupId) -> Result<Vec<(f64, usize)>> {
        let group = self.grp(id)?;
        let dimension = self.dim(group.dimension)?;
        let values = &self
            .records
            .column(dimension.column)
            .ok_or(CrossError::UnknownDimension(group.dimension.0))?
            .values;

        let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
        for (row, &value) in values.iter().enumerate() {
            let count = counts.entry(GroupKey(group.bucketing.key(value))).or_insert(0);
            if self.passes_except_dim(row, dimension) {
                *count += 1;
            }
        }
        Ok(counts.into_iter().map(|(k, c)| (k.0, c)).collect())
    }

    /// Records passing every filter (the "groupAll" count)
    pub fn selected_count(&self) -> usize {
        self.rejections.iter().filter(|&&r| r == 0).count()
    }

    pub fn dispose_group(&mut self, id: GroupId) -> Result<()> {
        self.grp(id)?;
        self.groups[id.0] = None;
        Ok(())
    }

    /// Remove a dimension, its filter and any groups still attached to it
    pub fn dispose_dimension(&mut self, id: DimensionId) -> Result<()> {
        self.filter(id, None)?;
        for slot in self.groups.iter_mut() {
            if slot.as_ref().is_some_and(|g| g.dimension == id) {
                *slot = None;
            }
        }
        self.dimensions[id.0] = None;
        Ok(())
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.iter().flatten().count()
    }

    pub fn group_count(&self) -> usize {
        self.groups.iter().flatten().count()
    }
}
