use std::sync::Arc;

use anyhow::Context;
use clap::ValueEnum;
use tracing::warn;

use crate::application::services::ShelfScanner;
use crate::domain::{BookLookup, TextExtractor};
use crate::infrastructure::ai::{ChatCleaner, ChatEndpoint, VisionExtractor, chat_completions_url};
use crate::infrastructure::ocr::TesseractExtractor;
use crate::infrastructure::retail::{RatedLookup, RetailSearchLookup, SearchEngineLookup};

/// A preset combination of pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Local OCR, language-model cleanup, direct retailer search
    Classic,
    /// Vision model, search engine restricted to the retailer
    Vision,
    /// Vision model, search engine, and product page ratings
    Rated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractorKind {
    Ocr,
    Vision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupKind {
    Direct,
    Search,
    SearchWithRating,
}

impl Profile {
    pub fn extractor(self) -> ExtractorKind {
        match self {
            Self::Classic => ExtractorKind::Ocr,
            Self::Vision | Self::Rated => ExtractorKind::Vision,
        }
    }

    pub fn cleanup(self) -> bool {
        matches!(self, Self::Classic)
    }

    pub fn lookup(self) -> LookupKind {
        match self {
            Self::Classic => LookupKind::Direct,
            Self::Vision => LookupKind::Search,
            Self::Rated => LookupKind::SearchWithRating,
        }
    }
}

/// Everything needed to assemble a [`ShelfScanner`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub extractor: ExtractorKind,
    pub cleanup: bool,
    pub lookup: LookupKind,
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub vision_model: String,
    pub cleanup_model: String,
    pub tesseract: String,
    pub retailer_url: String,
    pub retailer_name: String,
    pub search_url: String,
}

impl PipelineConfig {
    fn uses_language_model(&self) -> bool {
        self.cleanup || self.extractor == ExtractorKind::Vision
    }

    pub fn build_scanner(&self, client: &reqwest::Client) -> anyhow::Result<ShelfScanner> {
        if self.uses_language_model() && self.openai_api_key.is_empty() {
            warn!("OPENAI_API_KEY is not set; language model calls will fail");
        }

        let endpoint = ChatEndpoint {
            client: client.clone(),
            url: chat_completions_url(&self.openai_base_url),
            api_key: self.openai_api_key.clone(),
        };

        let extractor: Arc<dyn TextExtractor> = match self.extractor {
            ExtractorKind::Ocr => Arc::new(TesseractExtractor::new(&self.tesseract)),
            ExtractorKind::Vision => {
                Arc::new(VisionExtractor::new(endpoint.clone(), &self.vision_model))
            }
        };

        let lookup: Arc<dyn BookLookup> = match self.lookup {
            LookupKind::Direct => Arc::new(
                RetailSearchLookup::new(client.clone(), &self.retailer_url)
                    .context("invalid retailer URL")?,
            ),
            LookupKind::Search => Arc::new(self.search_engine_lookup(client)?),
            LookupKind::SearchWithRating => Arc::new(RatedLookup::new(
                Arc::new(self.search_engine_lookup(client)?),
                client.clone(),
            )),
        };

        let scanner = ShelfScanner::new(extractor, lookup);
        Ok(if self.cleanup {
            scanner.with_cleaner(Arc::new(ChatCleaner::new(endpoint, &self.cleanup_model)))
        } else {
            scanner
        })
    }

    fn search_engine_lookup(&self, client: &reqwest::Client) -> anyhow::Result<SearchEngineLookup> {
        SearchEngineLookup::new(client.clone(), &self.search_url, &self.retailer_url)
            .context("invalid search engine or retailer URL")
    }
}
