//! Crossfilter-style index over the transformed record set

pub mod index;
pub mod records;
pub mod selection;

pub use index::{Bucketing, DimensionFilter, DimensionId, FilterIndex, GroupId, GroupKey};
pub use records::{ColumnKind, RecordSet};
pub use selection::{SelectedRecord, Selection, SelectionScope, extract_selected};
