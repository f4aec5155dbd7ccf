//! # QR Card Renderer
//!
//! Turns the render tree produced by `card-core` into files.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐    ┌─────────┐    ┌────────────────────┐
//! │ RenderTree │ ─► │   SVG   │ ─► │ resvg / tiny-skia  │ ─► PNG / JPEG
//! └────────────┘    └─────────┘    └────────────────────┘
//! ```
//!
//! Rasterization lives behind the `export` feature; SVG output is always
//! available.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod file;

pub use error::{RenderError, RenderResult};
pub use export::{CardExporter, ExportConfig, ExportFormat};
pub use file::FileExporter;
