use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ExtractionError;
use crate::domain::extraction::{TextCleaner, TextExtractor, UploadedImage, split_lines};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_CLEANUP_MODEL: &str = "gpt-3.5-turbo";
const USER_AGENT: &str = "Shelfscan/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CLEANUP_TEMPERATURE: f32 = 0.3;

const VISION_PROMPT: &str = "This is a photo of a bookshelf. List every book whose spine you can read. \
Format each book as 'Title - Author' on its own line. Return ONLY the list, no numbering or other text.";

/// `https://api.openai.com/v1` → `https://api.openai.com/v1/chat/completions`.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn cleanup_prompt(raw_lines: &[String]) -> String {
    format!(
        "Extract book titles and authors from the following OCR results:\n\n{}\n\nFormat: Title - Author",
        raw_lines.join("\n")
    )
}

/// Connection details for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    pub client: reqwest::Client,
    pub url: String,
    pub api_key: String,
}

/// Reads book spines with a vision-capable chat model.
pub struct VisionExtractor {
    endpoint: ChatEndpoint,
    model: String,
}

impl VisionExtractor {
    pub fn new(endpoint: ChatEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for VisionExtractor {
    fn failure_prefix(&self) -> &'static str {
        "Error during processing"
    }

    #[tracing::instrument(skip(self, image), fields(model = %self.model, bytes = image.bytes.len()))]
    async fn extract(&self, image: &UploadedImage) -> Result<Vec<String>, ExtractionError> {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime_type(),
            BASE64.encode(&image.bytes)
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlDetail { url: data_url },
                    },
                ],
            }],
            temperature: None,
        };

        let (content, usage) = call_chat_completion(&self.endpoint, &request).await?;
        log_usage("vision-extract", &self.model, usage.as_ref());
        Ok(split_lines(&content))
    }
}

/// Reformats noisy OCR output into "Title - Author" lines with a text model.
pub struct ChatCleaner {
    endpoint: ChatEndpoint,
    model: String,
}

impl ChatCleaner {
    pub fn new(endpoint: ChatEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextCleaner for ChatCleaner {
    fn failure_prefix(&self) -> &'static str {
        "Error during AI cleanup"
    }

    #[tracing::instrument(skip(self, raw_lines), fields(model = %self.model, lines = raw_lines.len()))]
    async fn clean(&self, raw_lines: &[String]) -> Result<Vec<String>, ExtractionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentPart::Text {
                    text: cleanup_prompt(raw_lines),
                }],
            }],
            temperature: Some(CLEANUP_TEMPERATURE),
        };

        let (content, usage) = call_chat_completion(&self.endpoint, &request).await?;
        log_usage("ocr-cleanup", &self.model, usage.as_ref());
        Ok(split_lines(&content))
    }
}

// --- Internal helpers ---

async fn call_chat_completion(
    endpoint: &ChatEndpoint,
    request: &ChatRequest,
) -> Result<(String, Option<Usage>), ExtractionError> {
    let response = endpoint
        .client
        .post(&endpoint.url)
        .header("User-Agent", USER_AGENT)
        .bearer_auth(&endpoint.api_key)
        .timeout(REQUEST_TIMEOUT)
        .json(request)
        .send()
        .await
        .map_err(|e| ExtractionError::service(format!("OpenAI request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "(unreadable body)".to_string());
        return Err(ExtractionError::service(format!(
            "OpenAI returned status {status}: {body}"
        )));
    }

    let body = response.text().await.map_err(|e| {
        ExtractionError::service(format!("Failed to read OpenAI response body: {e}"))
    })?;

    let chat_response: ChatResponse = serde_json::from_str(&body)
        .map_err(|e| ExtractionError::service(format!("Failed to parse OpenAI response: {e}")))?;

    let content = chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ExtractionError::service("OpenAI returned an empty response"));
    }

    Ok((content, chat_response.usage))
}

fn log_usage(operation: &str, model: &str, usage: Option<&Usage>) {
    if let Some(usage) = usage {
        info!(
            operation,
            model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "language model usage"
        );
    }
}

// --- OpenAI API types ---

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlDetail },
}

#[derive(Debug, Serialize)]
struct ImageUrlDetail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
