use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use crate::application::errors::AppError;
use crate::application::routes::render_html;
use crate::application::state::AppState;
use crate::domain::UploadedImage;
use crate::presentation::web::templates::{ResultsTemplate, UploadTemplate};
use crate::presentation::web::views::BookResultView;

pub(crate) const NO_IMAGE_UPLOADED: &str = "No image uploaded";
const IMAGE_FIELD: &str = "image";

#[tracing::instrument]
pub(crate) async fn upload_page() -> Result<Html<String>, StatusCode> {
    render_html(UploadTemplate)
}

#[tracing::instrument(skip(state, multipart))]
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // A request that is not multipart at all simply has no image in it.
    let Ok(multipart) = multipart else {
        return Err(AppError::validation(NO_IMAGE_UPLOADED));
    };
    let image = read_image_field(multipart)
        .await?
        .ok_or_else(|| AppError::validation(NO_IMAGE_UPLOADED))?;

    info!(
        bytes = image.bytes.len(),
        file_name = image.file_name.as_deref().unwrap_or_default(),
        "processing upload"
    );

    let results = state.scanner.scan(&image).await?;

    let template = ResultsTemplate {
        retailer_name: &state.retailer_name,
        books: results.into_iter().map(BookResultView::from).collect(),
    };
    Ok(render_html(template).into_response())
}

/// Pull the first non-empty `image` field out of the form, ignoring others.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<UploadedImage>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read uploaded image: {e}")))?;

        if bytes.is_empty() {
            continue;
        }

        return Ok(Some(UploadedImage {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        }));
    }
    Ok(None)
}
