pub mod bundle;
pub mod csv_io;
pub mod dataset;
pub mod derived;
pub mod packed;

// Re-export key types for convenience
pub use dataset::Dataset;
pub use derived::{DerivedDimensions, derive_dimensions};
