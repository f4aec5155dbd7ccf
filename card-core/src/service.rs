//! Contracts for the external collaborators of the editor.
//!
//! The core never inspects what these services produce: a QR generator hands
//! back an opaque [`ImageRef`], an exporter receives the current
//! [`RenderTree`] and a filename, a printer receives nothing at all.
//! Futures are not required to be `Send`; the editor runs on a single UI
//! thread.

use async_trait::async_trait;

use crate::projection::RenderTree;
use crate::scene::ImageRef;
use crate::CardResult;

/// Produces a QR bitmap for a payload text.
#[async_trait(?Send)]
pub trait QrGenerator {
    /// Render `text` as a QR image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::Generation`] if the text cannot be encoded
    /// or the backing service fails.
    async fn generate(&self, text: &str) -> CardResult<ImageRef>;
}

/// Turns a rendered card into a downloadable raster image.
#[async_trait(?Send)]
pub trait Exporter {
    /// Export `tree` under `filename` (without extension).
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::Export`] if rendering or writing fails.
    async fn export(&self, tree: &RenderTree, filename: &str) -> CardResult<()>;
}

/// Hands the current visual output to the host's native print flow.
pub trait Printer {
    /// Start printing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::Print`] if the host refuses.
    fn print(&self) -> CardResult<()>;
}
