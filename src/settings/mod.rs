//! Variable settings, bucket resolution and per-chart display settings

pub mod buckets;
pub mod chart;
pub mod variable;

pub use buckets::round_to;
pub use chart::{ChartKind, ChartSettings, DisplaySettingsMap, compile_display_settings};
pub use variable::{SettingsGrid, VariableSettingsTable};
