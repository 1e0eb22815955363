use async_trait::async_trait;

use super::ExtractionError;

/// One uploaded file, held only for the duration of a request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: None,
            content_type: None,
        }
    }

    /// Best guess at the MIME type: sniffed from the bytes first, then the
    /// declared content type, then JPEG.
    pub fn mime_type(&self) -> String {
        if let Ok(format) = image::guess_format(&self.bytes) {
            return format.to_mime_type().to_string();
        }
        self.content_type
            .as_deref()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string()
    }
}

/// Turns an image into candidate "Title - Author" lines.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Prefix used for the synthetic result line when extraction fails,
    /// e.g. `Error during processing`.
    fn failure_prefix(&self) -> &'static str;

    async fn extract(&self, image: &UploadedImage) -> Result<Vec<String>, ExtractionError>;
}

/// Reformats raw extracted lines into "Title - Author" entries.
#[async_trait]
pub trait TextCleaner: Send + Sync {
    fn failure_prefix(&self) -> &'static str;

    async fn clean(&self, raw_lines: &[String]) -> Result<Vec<String>, ExtractionError>;
}

/// Split raw text into trimmed, non-empty lines, keeping order and duplicates.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
