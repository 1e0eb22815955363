use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    BookLookup, BookResult, ExtractionError, TextCleaner, TextExtractor, UploadedImage,
};

/// The upload → extract → (clean) → lookup pipeline.
///
/// Every stage after image decoding degrades instead of failing: extraction
/// and cleanup errors become a single explanatory result line, and a failed
/// lookup only costs that line its link.
#[derive(Clone)]
pub struct ShelfScanner {
    extractor: Arc<dyn TextExtractor>,
    cleaner: Option<Arc<dyn TextCleaner>>,
    lookup: Arc<dyn BookLookup>,
}

impl ShelfScanner {
    pub fn new(extractor: Arc<dyn TextExtractor>, lookup: Arc<dyn BookLookup>) -> Self {
        Self {
            extractor,
            cleaner: None,
            lookup,
        }
    }

    pub fn with_cleaner(mut self, cleaner: Arc<dyn TextCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Run the whole pipeline. Only an undecodable image is an error.
    #[tracing::instrument(skip_all, fields(bytes = image.bytes.len()))]
    pub async fn scan(&self, image: &UploadedImage) -> Result<Vec<BookResult>, ExtractionError> {
        let lines = match self.extract_lines(image).await {
            Ok(lines) => lines,
            Err(StageFailure {
                error: ExtractionError::MalformedImage(message),
                ..
            }) => return Err(ExtractionError::MalformedImage(message)),
            Err(failure) => return Ok(vec![failure_line(failure)]),
        };

        info!(lines = lines.len(), "looking up extracted lines");

        let mut results = Vec::with_capacity(lines.len());
        for line in lines {
            results.push(self.lookup_line(line).await);
        }
        Ok(results)
    }

    async fn extract_lines(&self, image: &UploadedImage) -> Result<Vec<String>, StageFailure> {
        let raw_lines = self
            .extractor
            .extract(image)
            .await
            .map_err(|err| StageFailure::new(self.extractor.failure_prefix(), err))?;

        let Some(cleaner) = &self.cleaner else {
            return Ok(raw_lines);
        };
        if raw_lines.is_empty() {
            return Ok(raw_lines);
        }

        cleaner
            .clean(&raw_lines)
            .await
            .map_err(|err| StageFailure::new(cleaner.failure_prefix(), err))
    }

    async fn lookup_line(&self, line: String) -> BookResult {
        match self.lookup.lookup(&line).await {
            Ok(result) => BookResult::found(line, result),
            Err(err) => {
                warn!(line = %line, error = %err, "lookup failed");
                BookResult::lookup_failed(line, err.to_string())
            }
        }
    }
}

/// An extraction or cleanup error tagged with the stage that produced it.
struct StageFailure {
    prefix: &'static str,
    error: ExtractionError,
}

impl StageFailure {
    fn new(prefix: &'static str, error: ExtractionError) -> Self {
        Self { prefix, error }
    }
}

fn failure_line(failure: StageFailure) -> BookResult {
    warn!(stage = failure.prefix, error = %failure.error, "extraction degraded to an error line");
    BookResult::extraction_failed(failure.prefix, failure.error.to_string())
}
