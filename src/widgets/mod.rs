//! Reusable UI widgets for CrossOxide

mod chart_header;
mod count_readout;

pub use chart_header::ChartHeader;
pub use count_readout::CountReadout;
