//! Renderer error types.

use card_core::CardError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rendering or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The format is unknown or was compiled out.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RenderError> for CardError {
    fn from(error: RenderError) -> Self {
        Self::Export(error.to_string())
    }
}
