use async_trait::async_trait;
use serde::Serialize;

use super::LookupError;

pub const NO_RATING: &str = "No rating";
pub const RATING_FETCH_ERROR: &str = "Error fetching rating";

/// Outcome of looking up one line on the retailer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub link: Option<String>,
    pub rating: Option<String>,
}

impl LookupResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            rating: None,
        }
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }
}

#[async_trait]
pub trait BookLookup: Send + Sync {
    async fn lookup(&self, line: &str) -> Result<LookupResult, LookupError>;
}
