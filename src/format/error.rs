//! Error types for annotation export.

use thiserror::Error;

use crate::error::EditError;

/// Errors that can occur while exporting annotations.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The editing state could not be read
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Image dimensions required but not available
    #[error("Image dimensions required for format '{format}' but not available for image '{image}'")]
    MissingDimensions {
        /// The format requiring dimensions
        format: String,
        /// The image missing dimensions
        image: String,
    },
}

impl FormatError {
    /// Create a missing dimensions error.
    pub fn missing_dimensions(format: impl Into<String>, image: impl Into<String>) -> Self {
        Self::MissingDimensions {
            format: format.into(),
            image: image.into(),
        }
    }
}
