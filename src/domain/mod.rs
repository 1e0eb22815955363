pub mod errors;
pub mod extraction;
pub mod lookup;
pub mod results;

// Re-exports
pub use errors::{ExtractionError, LookupError};
pub use extraction::{TextCleaner, TextExtractor, UploadedImage};
pub use lookup::{BookLookup, LookupResult};
pub use results::BookResult;
