use std::sync::Arc;

use crate::application::config::PipelineConfig;
use crate::application::services::ShelfScanner;

/// Shared, read-only request state. Everything that varies between
/// production and tests is injected here at construction time.
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<ShelfScanner>,
    pub retailer_name: Arc<str>,
}

impl AppState {
    pub fn new(scanner: ShelfScanner, retailer_name: impl Into<Arc<str>>) -> Self {
        Self {
            scanner: Arc::new(scanner),
            retailer_name: retailer_name.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> anyhow::Result<Self> {
        let http_client = build_http_client()?;
        let scanner = config.build_scanner(&http_client)?;
        Ok(Self::new(scanner, config.retailer_name.as_str()))
    }
}

pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}
