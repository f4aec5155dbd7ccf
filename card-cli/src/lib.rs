//! # QR Card CLI
//!
//! Command-line host for the QR card designer.
//!
//! ## Usage
//!
//! ```bash
//! # List the built-in templates
//! qrcard templates
//!
//! # Render a template with a QR code to ./out/card.png
//! qrcard render --template ocean-gradient --payload "https://example.com" --out out
//!
//! # Replay recorded input events and print the resulting document
//! qrcard replay events.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap (with `QRCARD_*` env fallbacks)
//! - `CliConfig` - Resolved configuration, built with `From<CliArgs>`
//! - `CommandQrGenerator` - QR bitmaps from an external encoder command
//! - `commands` - The subcommand implementations

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;
mod generator;

pub use generator::CommandQrGenerator;

use std::path::PathBuf;

use anyhow::Context;
use card_core::{EditorConfig, PayloadOrdering};
use card_renderer::ExportFormat;
use clap::{Parser, Subcommand, ValueEnum};

/// Encoder used when no `--qr-command` is given.
pub const DEFAULT_QR_COMMAND: &str = "qrencode -t SVG -o - {text}";

/// Command-line arguments for qrcard.
#[derive(Debug, Clone, Parser)]
#[command(name = "qrcard")]
#[command(about = "Design and export QR code cards")]
#[command(version)]
pub struct CliArgs {
    /// Editor configuration file (JSON)
    #[arg(long, env = "QRCARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Template catalog file (JSON array); the built-in templates are used otherwise
    #[arg(long, env = "QRCARD_TEMPLATES", global = true)]
    pub templates: Option<PathBuf>,

    /// QR encoder command; `{text}` is replaced by the payload
    #[arg(long, env = "QRCARD_QR_COMMAND", default_value = DEFAULT_QR_COMMAND, global = true)]
    pub qr_command: String,

    /// Override the drag clamping floor
    #[arg(long, env = "QRCARD_DRAG_FLOOR", global = true)]
    pub drag_floor: Option<f32>,

    /// Override the ordering of overlapping payload updates
    #[arg(long, env = "QRCARD_PAYLOAD_ORDERING", value_enum, global = true)]
    pub payload_ordering: Option<OrderingArg>,

    /// Commit drag moves once per frame
    #[arg(long, env = "QRCARD_COALESCE_MOVES", global = true)]
    pub coalesce_moves: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List available templates
    Templates,

    /// Render a template to an image file
    Render {
        /// Template id (defaults to the first template)
        #[arg(long)]
        template: Option<String>,

        /// Text to encode in the QR code
        #[arg(long)]
        payload: Option<String>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// File name without extension
        #[arg(long, default_value = "qr-card-design")]
        filename: String,

        /// Output format (png, jpeg, svg)
        #[arg(long, default_value = "png")]
        format: ExportFormat,

        /// Scale factor for raster output
        #[arg(long, default_value = "2.0")]
        scale: f32,
    },

    /// Replay a JSON array of input events and print the result
    Replay {
        /// Events file
        events: PathBuf,

        /// Template to start from (defaults to the first template)
        #[arg(long)]
        template: Option<String>,

        /// Print the render tree instead of the document
        #[arg(long)]
        tree: bool,
    },
}

/// Payload ordering as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingArg {
    /// Only the newest request may commit.
    LatestRequest,
    /// Whatever resolves last commits.
    LatestResolution,
}

impl From<OrderingArg> for PayloadOrdering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::LatestRequest => Self::LatestRequest,
            OrderingArg::LatestResolution => Self::LatestResolution,
        }
    }
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Editor configuration file.
    pub config_path: Option<PathBuf>,
    /// Template catalog file.
    pub templates_path: Option<PathBuf>,
    /// QR encoder command line.
    pub qr_command: String,
    /// Drag floor override.
    pub drag_floor: Option<f32>,
    /// Payload ordering override.
    pub payload_ordering: Option<PayloadOrdering>,
    /// Coalescing override (only ever switches it on).
    pub coalesce_moves: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_path: None,
            templates_path: None,
            qr_command: DEFAULT_QR_COMMAND.to_string(),
            drag_floor: None,
            payload_ordering: None,
            coalesce_moves: false,
        }
    }

    /// Load the editor configuration file, if any, and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn editor_config(&self) -> anyhow::Result<EditorConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                EditorConfig::from_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => EditorConfig::default(),
        };

        if let Some(floor) = self.drag_floor {
            config.drag_floor = floor;
        }
        if let Some(ordering) = self.payload_ordering {
            config.payload_ordering = ordering;
        }
        if self.coalesce_moves {
            config.coalesce_pointer_moves = true;
        }
        Ok(config)
    }
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            config_path: args.config,
            templates_path: args.templates,
            qr_command: args.qr_command,
            drag_floor: args.drag_floor,
            payload_ordering: args.payload_ordering.map(PayloadOrdering::from),
            coalesce_moves: args.coalesce_moves,
        }
    }
}
