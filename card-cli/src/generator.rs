//! QR bitmaps from an external encoder command.

use async_trait::async_trait;
use base64::Engine;
use card_core::{CardError, CardResult, ImageRef, QrGenerator};
use tokio::process::Command;

const TEXT_PLACEHOLDER: &str = "{text}";

/// Runs an encoder such as `qrencode -t SVG -o - {text}` and wraps its
/// stdout as a base64 data URI.
///
/// Every `{text}` in the arguments is replaced by the payload; if there is
/// none, the payload is appended as the last argument.
#[derive(Debug, Clone)]
pub struct CommandQrGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandQrGenerator {
    /// Split a command line on whitespace. Returns `None` if it is empty.
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn args_for(&self, text: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(TEXT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(TEXT_PLACEHOLDER, text)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(text.to_string());
        }
        args
    }
}

/// Guess the media type of encoder output.
fn media_type(bytes: &[u8]) -> &'static str {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || head.starts_with("<?xml") {
        "image/svg+xml"
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/png"
    }
}

#[async_trait(?Send)]
impl QrGenerator for CommandQrGenerator {
    async fn generate(&self, text: &str) -> CardResult<ImageRef> {
        let output = Command::new(&self.program)
            .args(self.args_for(text))
            .output()
            .await
            .map_err(|e| CardError::Generation(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CardError::Generation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(CardError::Generation(format!(
                "{} produced no output",
                self.program
            )));
        }

        tracing::debug!(
            program = %self.program,
            bytes = output.stdout.len(),
            "Generated QR bitmap"
        );
        let encoded = base64::engine::general_purpose::STANDARD.encode(&output.stdout);
        Ok(ImageRef::new(format!(
            "data:{};base64,{encoded}",
            media_type(&output.stdout)
        )))
    }
}
