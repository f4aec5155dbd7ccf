//! Subcommand implementations.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use card_core::{CardEditor, Document, InputEvent, PayloadOutcome, RenderTree, TemplateCatalog};
use card_renderer::{ExportConfig, ExportFormat, FileExporter};

use crate::{CliConfig, Command, CommandQrGenerator};

/// Load the template catalog from a file, or the built-in one.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no templates.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<TemplateCatalog> {
    let Some(path) = path else {
        return Ok(TemplateCatalog::builtin());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading templates {}", path.display()))?;
    TemplateCatalog::from_json(&json)
        .with_context(|| format!("parsing templates {}", path.display()))
}

/// One line per template: id, name, size and element count.
#[must_use]
pub fn templates_table(catalog: &TemplateCatalog) -> String {
    let mut out = String::new();
    for (index, template) in catalog.iter().enumerate() {
        let marker = if index == 0 { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<20} {:<20} {}x{}  {} elements",
            template.id,
            template.name,
            template.width,
            template.height,
            template.elements.len()
        );
    }
    out
}

/// Parse a JSON array of input events.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn parse_events(json: &str) -> anyhow::Result<Vec<InputEvent>> {
    serde_json::from_str(json).context("parsing events")
}

/// Feed `events` through the editor, committing coalesced moves after each
/// one as a browser would on the next frame.
pub fn replay(editor: &mut CardEditor, events: &[InputEvent]) {
    for event in events {
        editor.handle(event);
        editor.animation_frame();
    }
    editor.reset_interaction();
}

/// Result of a replay, ready to print.
#[derive(Debug, Clone)]
pub enum ReplayOutput {
    /// The final document.
    Document(Document),
    /// The final render tree.
    Tree(RenderTree),
}

impl ReplayOutput {
    /// Pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let json = match self {
            Self::Document(document) => serde_json::to_string_pretty(document)?,
            Self::Tree(tree) => serde_json::to_string_pretty(tree)?,
        };
        Ok(json)
    }
}

async fn start_editor(
    config: &CliConfig,
    template: Option<&str>,
    generator: &CommandQrGenerator,
) -> anyhow::Result<CardEditor> {
    let catalog = load_catalog(config.templates_path.as_deref())?;
    let mut editor = CardEditor::new(config.editor_config()?, catalog);
    if let Some(id) = template {
        editor.select_template(id, generator).await?;
    }
    Ok(editor)
}

fn generator(config: &CliConfig) -> anyhow::Result<CommandQrGenerator> {
    match CommandQrGenerator::parse(&config.qr_command) {
        Some(generator) => Ok(generator),
        None => bail!("empty QR command"),
    }
}

/// Render a template with an optional payload and write it to disk.
///
/// # Errors
///
/// Returns an error if the template is unknown, QR generation fails or the
/// file cannot be written.
#[allow(clippy::too_many_arguments)]
pub async fn render(
    config: &CliConfig,
    template: Option<&str>,
    payload: Option<&str>,
    out: &Path,
    filename: &str,
    format: ExportFormat,
    scale: f32,
) -> anyhow::Result<PathBuf> {
    let generator = generator(config)?;
    let editor = start_editor(config, template, &generator).await?;

    if let Some(payload) = payload {
        match editor.submit_payload(payload, &generator).await {
            Some(PayloadOutcome::Failed) => bail!("QR generation failed"),
            Some(_) => {}
            None => tracing::warn!("Empty payload, rendering QR placeholder"),
        }
    }

    let exporter = FileExporter::new(
        out,
        format,
        ExportConfig {
            scale,
            ..ExportConfig::default()
        },
    );
    editor.export(&exporter, filename).await?;
    Ok(exporter.output_path(filename))
}

/// Replay an events file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the template is
/// unknown.
pub async fn replay_file(
    config: &CliConfig,
    events: &Path,
    template: Option<&str>,
    tree: bool,
) -> anyhow::Result<ReplayOutput> {
    let json = std::fs::read_to_string(events)
        .with_context(|| format!("reading events {}", events.display()))?;
    let events = parse_events(&json)?;

    let generator = generator(config)?;
    let mut editor = start_editor(config, template, &generator).await?;
    replay(&mut editor, &events);
    tracing::info!(events = events.len(), "Replayed events");

    Ok(if tree {
        ReplayOutput::Tree(editor.render())
    } else {
        ReplayOutput::Document(editor.store().snapshot())
    })
}

/// Run a subcommand and return what should be printed.
///
/// # Errors
///
/// Returns the subcommand's error.
pub async fn run(config: &CliConfig, command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Templates => {
            let catalog = load_catalog(config.templates_path.as_deref())?;
            Ok(templates_table(&catalog))
        }
        Command::Render {
            template,
            payload,
            out,
            filename,
            format,
            scale,
        } => {
            let path = render(
                config,
                template.as_deref(),
                payload.as_deref(),
                out,
                filename,
                *format,
                *scale,
            )
            .await?;
            Ok(format!("{}\n", path.display()))
        }
        Command::Replay {
            events,
            template,
            tree,
        } => {
            let output = replay_file(config, events, template.as_deref(), *tree).await?;
            Ok(format!("{}\n", output.to_json()?))
        }
    }
}
