use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The upload could not be decoded as an image. This is the one failure
    /// that aborts a scan instead of degrading into a result line.
    #[error("uploaded file is not a readable image: {0}")]
    MalformedImage(String),
    #[error("{0}")]
    Service(String),
}

impl ExtractionError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search returned status {0}")]
    Status(u16),
    #[error("invalid search URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<url::ParseError> for LookupError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
