//! Export to files on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use card_core::{CardResult, Exporter, RenderTree};

use crate::error::RenderResult;
use crate::export::{CardExporter, ExportConfig, ExportFormat};

/// Writes exported cards into a directory as `<filename>.<ext>`.
#[derive(Debug, Clone)]
pub struct FileExporter {
    directory: PathBuf,
    format: ExportFormat,
    exporter: CardExporter,
}

impl FileExporter {
    /// Create an exporter writing `format` files into `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, format: ExportFormat, config: ExportConfig) -> Self {
        Self {
            directory: directory.into(),
            format,
            exporter: CardExporter::new(config),
        }
    }

    /// The output directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where `filename` would be written.
    #[must_use]
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.directory
            .join(format!("{filename}.{}", self.format.extension()))
    }

    /// Render `tree` and write it, returning the written path.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn write(&self, tree: &RenderTree, filename: &str) -> RenderResult<PathBuf> {
        let bytes = self.exporter.export(tree, self.format)?;
        std::fs::create_dir_all(&self.directory)?;
        let path = self.output_path(filename);
        std::fs::write(&path, &bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote card export");
        Ok(path)
    }
}

#[async_trait(?Send)]
impl Exporter for FileExporter {
    async fn export(&self, tree: &RenderTree, filename: &str) -> CardResult<()> {
        self.write(tree, filename)?;
        Ok(())
    }
}
