//! Error types for CrossOxide
//!
//! Every fallible operation in the dashboard returns [`CrossError`]. The UI
//! layer turns errors into a blocking dialog through [`CrossError::user_message`]
//! and [`CrossError::title`].

use thiserror::Error;

/// Main error type for CrossOxide operations
#[derive(Error, Debug)]
pub enum CrossError {
    /// File I/O error
    #[error("Failed to access file: {0}")]
    FileIo(#[from] std::io::Error),

    /// Polars data processing error
    #[error("Data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Base64 payload of a JSON bundle could not be decoded
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundle contents did not carry the expected type marker
    #[error("Unrecognized bundle contents: {0}")]
    MalformedBundle(String),

    /// Bundle archive is missing its data entry
    #[error("Bundle archive has no '{entry}' entry")]
    MissingBundleEntry { entry: String },

    /// Unsupported file format
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// Column not found in data
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Empty dataset error
    #[error("Dataset is empty or has no rows")]
    EmptyDataset,

    /// Data validation error
    #[error("Data validation failed: {0}")]
    Validation(String),

    /// A chart handle from a disposed generation was used
    #[error("Chart belongs to generation {handle}, current generation is {current}")]
    StaleGeneration { handle: u64, current: u64 },

    /// Dimension id does not exist (or was disposed)
    #[error("Unknown dimension {0}")]
    UnknownDimension(usize),

    /// Group id does not exist (or was disposed)
    #[error("Unknown group {0}")]
    UnknownGroup(usize),

    /// The platform could not provide a file dialog
    #[error("File access is not available: {0}")]
    FileApiUnavailable(String),
}

/// Result type alias for CrossOxide operations
pub type Result<T> = std::result::Result<T, CrossError>;

/// UI-friendly error message formatting
impl CrossError {
    /// Get a user-friendly error message suitable for displaying in UI
    pub fn user_message(&self) -> String {
        match self {
            CrossError::FileIo(e) => format!("File error: {}", e),
            CrossError::Polars(e) => format!("Data error: {}", e),
            CrossError::Csv(e) => format!("CSV error: {}", e),
            CrossError::Archive(e) => format!("Could not read bundle archive: {}", e),
            CrossError::Base64(e) => format!("Bundle payload is not valid base64: {}", e),
            CrossError::Json(e) => format!("JSON error: {}", e),
            CrossError::MalformedBundle(found) => {
                format!("Unrecognized bundle contents (type: {})", found)
            }
            CrossError::MissingBundleEntry { entry } => {
                format!("Bundle is missing '{}'", entry)
            }
            CrossError::UnsupportedFormat { extension } => {
                format!("Unsupported file format: '.{}'", extension)
            }
            CrossError::ColumnNotFound { column } => {
                format!("Column '{}' not found", column)
            }
            CrossError::EmptyDataset => "Dataset is empty".to_string(),
            CrossError::Validation(msg) => format!("Validation error: {}", msg),
            CrossError::StaleGeneration { .. } => {
                "Charts were rebuilt; the interaction was ignored".to_string()
            }
            CrossError::UnknownDimension(id) => format!("Unknown dimension #{}", id),
            CrossError::UnknownGroup(id) => format!("Unknown group #{}", id),
            CrossError::FileApiUnavailable(msg) => {
                format!("Your system does not support the necessary file APIs: {}", msg)
            }
        }
    }

    /// Get a short title for the error (for the error dialog)
    pub fn title(&self) -> &'static str {
        match self {
            CrossError::FileIo(_) => "File Error",
            CrossError::Polars(_) => "Data Error",
            CrossError::Csv(_) => "CSV Error",
            CrossError::Archive(_) | CrossError::Base64(_) => "Bundle Error",
            CrossError::Json(_) => "JSON Error",
            CrossError::MalformedBundle(_) | CrossError::MissingBundleEntry { .. } => {
                "Invalid Bundle"
            }
            CrossError::UnsupportedFormat { .. } => "Unsupported Format",
            CrossError::ColumnNotFound { .. } => "Column Not Found",
            CrossError::EmptyDataset => "Empty Dataset",
            CrossError::Validation(_) => "Validation Error",
            CrossError::StaleGeneration { .. } => "Stale Chart",
            CrossError::UnknownDimension(_) | CrossError::UnknownGroup(_) => "Internal Error",
            CrossError::FileApiUnavailable(_) => "Unsupported System",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CrossError::ColumnNotFound {
            column: "Temperature".to_string(),
        };
        assert_eq!(err.user_message(), "Column 'Temperature' not found");
        assert_eq!(err.title(), "Column Not Found");

        let err = CrossError::MalformedBundle("somethingElse".to_string());
        assert_eq!(
            err.user_message(),
            "Unrecognized bundle contents (type: somethingElse)"
        );
        assert_eq!(err.title(), "Invalid Bundle");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CrossError = io_err.into();
        assert!(matches!(err, CrossError::FileIo(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CrossError = json_err.into();
        assert!(matches!(err, CrossError::Json(_)));
    }
}
