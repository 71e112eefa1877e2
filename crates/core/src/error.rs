//! Error types for epigis

use thiserror::Error;

/// Main error type for epigis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Feature {feature}: no displaced point fell inside the envelope after {attempts} attempts")]
    PointOutsideEnvelope { feature: String, attempts: u32 },

    #[error("Cannot summarize an empty series")]
    EmptySeries,

    #[error("Spatial index build failed: {0}")]
    IndexBuild(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),
}

/// Result type alias for epigis operations
pub type Result<T> = std::result::Result<T, Error>;
