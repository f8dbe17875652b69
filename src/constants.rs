//! Application-wide constants and default values
//!
//! This module centralizes all magic numbers and default values used throughout
//! the application, making them easier to maintain and configure.

/// Application version, written into every saved bundle
pub const VERSION: &str = "1.0.0";

/// Bundle format constants
pub mod bundle {
    /// Type marker every bundle must carry
    pub const BUNDLE_TYPE: &str = "crossfilterBundle";

    /// Name of the single archive entry holding the bundle JSON
    pub const DATA_ENTRY: &str = "data.json";

    /// Deflate level used when writing bundles
    pub const COMPRESSION_LEVEL: i64 = 9;
}

/// Histogram and filtering defaults
pub mod histogram {
    /// Target number of buckets for numeric variable histograms
    pub const NUM_HIST_BINS: usize = 40;
}

/// Interaction timing defaults
pub mod timing {
    /// Debounce window for rapid-fire triggers (filter events)
    pub const UI_DEBOUNCE_MILLIS: u64 = 100;
}

/// Data preview defaults
pub mod preview {
    /// Number of rows shown in the data preview table
    pub const DATA_PREVIEW_NUM_ROWS: usize = 100;
}

/// Names of the dimensions derived from the date column
pub mod derived {
    pub const YEAR_MONTH: &str = "YearMonth";
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const WEEKDAY: &str = "Weekday";
    pub const HOUR: &str = "Hour";

    /// Record name of a date column whose header is one of [`NAMES`]
    pub const DATE_RECORD: &str = "Date";

    /// Derived column names in display order
    pub const NAMES: [&str; 5] = [YEAR_MONTH, YEAR, MONTH, WEEKDAY, HOUR];
}

/// Variable settings table column headers
pub mod settings_table {
    pub const COLUMN_NAME: &str = "Column Name";
    pub const DISPLAY_MIN: &str = "Display Min";
    pub const DISPLAY_MAX: &str = "Display Max";
    pub const NAN_SUBSTITUTE: &str = "NaN Substitute";

    /// Headers in grid order
    pub const HEADERS: [&str; 4] = [COLUMN_NAME, DISPLAY_MIN, DISPLAY_MAX, NAN_SUBSTITUTE];
}

/// Chart layout defaults
pub mod chart {
    /// Default chart width in points
    pub const DEFAULT_WIDTH: f32 = 243.0;

    /// Default chart height in points
    pub const DEFAULT_HEIGHT: f32 = 200.0;

    /// Width of the full-row YearMonth timeline chart
    pub const TIMELINE_WIDTH: f32 = 729.0;

    /// Height of the YearMonth timeline chart
    pub const TIMELINE_HEIGHT: f32 = 100.0;

    /// Pie chart outer radius
    pub const PIE_RADIUS: f32 = 98.0;

    /// Pie chart inner radius
    pub const PIE_INNER_RADIUS: f32 = 25.0;

    /// Minimum slice angle (radians) that still gets a label
    pub const PIE_MIN_ANGLE_FOR_LABEL: f32 = 0.4;

    /// Default number of y-axis ticks on bar charts
    pub const DEFAULT_Y_TICKS: usize = 5;

    /// Vertical offset of row chart labels
    pub const ROW_LABEL_OFFSET_Y: f32 = 12.0;

    /// Weekday labels indexed by weekday number (0 = Sunday)
    pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

    /// Weekday row colors, Sunday first
    pub const WEEKDAY_COLORS: [(u8, u8, u8); 7] = [
        (0xe6, 0x55, 0x0d),
        (0x31, 0x82, 0xbd),
        (0x6b, 0xae, 0xd6),
        (0x9e, 0xca, 0xe1),
        (0xbd, 0xa9, 0xcc),
        (0x99, 0x89, 0xa6),
        (0xfd, 0x8d, 0x3c),
    ];
}

/// UI layout defaults
pub mod layout {
    /// Side panel (toolbar and settings) default width
    pub const SIDE_PANEL_WIDTH: f32 = 320.0;

    /// Bivariate panel default height
    pub const BIVARIATE_PANEL_HEIGHT: f32 = 320.0;

    /// Table row height
    pub const TABLE_ROW_HEIGHT: f32 = 18.0;

    /// Table header row height
    pub const TABLE_HEADER_HEIGHT: f32 = 22.0;
}

/// Configuration file paths
pub mod config {
    /// Configuration file name
    pub const CONFIG_FILE: &str = "cross-oxide.json";
}
