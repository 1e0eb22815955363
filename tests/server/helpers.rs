use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use shelfscan::application::PipelineConfig;
use shelfscan::application::routes::app_router;
use shelfscan::application::services::ShelfScanner;
use shelfscan::application::state::AppState;
use shelfscan::domain::{
    BookLookup, ExtractionError, LookupError, LookupResult, TextExtractor, UploadedImage,
};
use tokio::net::TcpListener;
use tokio::task::AbortHandle;

pub struct TestApp {
    pub address: String,
    #[allow(dead_code)]
    pub mock_server: Option<wiremock::MockServer>,
    server_handle: AbortHandle,
}

impl TestApp {
    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// POST `form` to `/upload`.
    pub async fn upload(&self, form: Form) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.page_url("/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_app(scanner: ShelfScanner) -> TestApp {
    spawn_app_inner(AppState::new(scanner, "Amazon"), None).await
}

/// Spawn the app wired from a real `PipelineConfig` whose outbound URLs all
/// point at one wiremock server.
pub async fn spawn_app_with_mock(
    configure: impl FnOnce(&mut PipelineConfig, &str),
) -> TestApp {
    let mock_server = wiremock::MockServer::start().await;
    let mut config = mock_pipeline_config(&mock_server.uri());
    configure(&mut config, &mock_server.uri());

    let state = AppState::from_config(&config).expect("Failed to build app state");
    spawn_app_inner(state, Some(mock_server)).await
}

pub fn mock_pipeline_config(base: &str) -> PipelineConfig {
    PipelineConfig {
        extractor: shelfscan::application::ExtractorKind::Vision,
        cleanup: false,
        lookup: shelfscan::application::LookupKind::SearchWithRating,
        openai_base_url: format!("{base}/v1"),
        openai_api_key: "sk-test".to_string(),
        vision_model: "gpt-4o".to_string(),
        cleanup_model: "gpt-3.5-turbo".to_string(),
        tesseract: "/nonexistent/tesseract".to_string(),
        retailer_url: base.to_string(),
        retailer_name: "Amazon".to_string(),
        search_url: format!("{base}/html/"),
    }
}

async fn spawn_app_inner(state: AppState, mock_server: Option<wiremock::MockServer>) -> TestApp {
    let app = app_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");

    let local_addr = listener.local_addr().expect("Failed to get local address");
    let address = format!("http://{}", local_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Server failed to start");
    })
    .abort_handle();

    TestApp {
        address,
        mock_server,
        server_handle,
    }
}

// --- Stub collaborators ---

/// Returns fixed lines, or fails with a fixed message.
pub struct StubExtractor {
    outcome: Result<Vec<String>, String>,
}

impl StubExtractor {
    pub fn lines(lines: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(lines.iter().map(ToString::to_string).collect()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl TextExtractor for StubExtractor {
    fn failure_prefix(&self) -> &'static str {
        "Error during processing"
    }

    async fn extract(&self, _image: &UploadedImage) -> Result<Vec<String>, ExtractionError> {
        self.outcome.clone().map_err(ExtractionError::Service)
    }
}

/// Answers from a fixed table; unknown lines are "not found".
#[derive(Default)]
pub struct StubLookup {
    answers: HashMap<String, LookupResult>,
    failing: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, line: &str, result: LookupResult) -> Self {
        self.answers.insert(line.to_string(), result);
        self
    }

    pub fn fail(mut self, line: &str) -> Self {
        self.failing.push(line.to_string());
        self
    }
}

#[async_trait]
impl BookLookup for StubLookup {
    async fn lookup(&self, line: &str) -> Result<LookupResult, LookupError> {
        self.calls.lock().unwrap().push(line.to_string());
        if self.failing.iter().any(|l| l == line) {
            return Err(LookupError::Status(503));
        }
        Ok(self.answers.get(line).cloned().unwrap_or_default())
    }
}

/// A stand-in OCR engine: a shell script that drains stdin and prints
/// `output`. The directory must outlive the app using the script.
pub fn fake_tesseract(output: &str) -> (tempfile::TempDir, String) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tesseract");
    let script = format!(
        "#!/bin/sh\ncat > /dev/null\nprintf '%s' '{}'\n",
        output.replace('\'', r"'\''")
    );
    std::fs::write(&path, script).expect("Failed to write OCR script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark OCR script executable");
    (dir, path.to_string_lossy().into_owned())
}

// --- Request helpers ---

pub fn tiny_png() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(8, 8, image::Rgb([250, 250, 250]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

pub fn image_form(bytes: Vec<u8>) -> Form {
    let part = Part::bytes(bytes)
        .file_name("shelf.png")
        .mime_str("image/png")
        .expect("valid mime");
    Form::new().part("image", part)
}

/// Number of rendered result blocks.
pub fn book_blocks(body: &str) -> usize {
    body.matches(r#"<div class="book">"#).count()
}

/// Number of result links (the back-to-upload link is not counted).
pub fn result_links(body: &str) -> usize {
    body.matches(r#"target="_blank""#).count()
}
