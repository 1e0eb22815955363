use serde::Serialize;

use super::LookupResult;

/// One rendered row of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookResult {
    pub text: String,
    pub link: Option<String>,
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BookResult {
    pub fn found(text: impl Into<String>, lookup: LookupResult) -> Self {
        Self {
            text: text.into(),
            link: lookup.link,
            rating: lookup.rating,
            error: None,
        }
    }

    /// A line whose lookup failed; it renders as "not found".
    pub fn lookup_failed(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
            rating: None,
            error: Some(error.into()),
        }
    }

    /// The single synthetic line that replaces a failed extraction or cleanup.
    pub fn extraction_failed(prefix: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            text: format!("{prefix}: {error}"),
            link: None,
            rating: None,
            error: Some(error),
        }
    }
}
