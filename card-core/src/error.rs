//! Error types for card operations.

use thiserror::Error;

use crate::element::ElementId;

/// Result type for card operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur in card operations.
///
/// None of these are fatal: every failure leaves the document unchanged.
#[derive(Debug, Error)]
pub enum CardError {
    /// An element with this id already exists.
    #[error("Duplicate element id: {0}")]
    DuplicateElement(ElementId),

    /// Template not found in the catalog.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// QR bitmap generation failed.
    #[error("QR generation failed: {0}")]
    Generation(String),

    /// Export of the rendered card failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The host print flow failed.
    #[error("Print failed: {0}")]
    Print(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
