use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::ExtractionError;
use crate::domain::extraction::{TextExtractor, UploadedImage, split_lines};

pub const DEFAULT_TESSERACT: &str = "tesseract";

/// Local OCR through the `tesseract` command line engine.
///
/// The upload is decoded first so that a corrupt file is reported as such
/// instead of as an OCR failure. The original bytes are then piped to
/// `tesseract stdin stdout`.
pub struct TesseractExtractor {
    program: String,
}

impl TesseractExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT)
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    fn failure_prefix(&self) -> &'static str {
        "Error during OCR processing"
    }

    #[tracing::instrument(skip(self, image), fields(program = %self.program, bytes = image.bytes.len()))]
    async fn extract(&self, image: &UploadedImage) -> Result<Vec<String>, ExtractionError> {
        validate_image(image.bytes.clone()).await?;
        let text = self.run(&image.bytes).await?;
        let lines = split_lines(&text);
        debug!(lines = lines.len(), "ocr finished");
        Ok(lines)
    }
}

impl TesseractExtractor {
    async fn run(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExtractionError::service(format!("failed to run {}: {e}", self.program))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExtractionError::service("tesseract stdin unavailable"))?;

        let feed = async move {
            let result = stdin.write_all(bytes).await;
            drop(stdin);
            result
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output
            .map_err(|e| ExtractionError::service(format!("tesseract did not finish: {e}")))?;
        fed.map_err(|e| ExtractionError::service(format!("failed to send image to tesseract: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::service(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ExtractionError::service(format!("invalid UTF-8 from tesseract: {e}")))
    }
}

/// Decode the image off the async runtime, rejecting anything unreadable.
async fn validate_image(bytes: Vec<u8>) -> Result<(), ExtractionError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map(|_| ()))
        .await
        .map_err(|e| ExtractionError::service(format!("image decoding task panicked: {e}")))?
        .map_err(|e| ExtractionError::MalformedImage(e.to_string()))
}
