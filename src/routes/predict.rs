//! Predict routes
//!
//! Endpoints:
//! - GET /api/v1/predict - Current page state, overlay and result rows
//! - DELETE /api/v1/predict - Forget the document and any running prediction
//! - POST /api/v1/predict/file?name= - Load an uploaded document (raw body)
//! - POST /api/v1/predict/url - Load a document by URL
//! - POST /api/v1/predict/run - Run the trained model on the document
//! - GET /api/v1/predict/image - Rendered page as a data URI
//! - POST /api/v1/predict/page/:page - Show another page
//! - POST /api/v1/predict/highlight - Mouse enter/leave on a field
//! - POST /api/v1/predict/select - Click on a prediction
//! - GET /api/v1/predict/script - Download the analysis script

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::document::RenderedPage;
use crate::error::{AppError, Result};
use crate::predict::PredictView;
use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_view).delete(reset))
        .route("/file", post(load_file))
        .route("/url", post(load_url))
        .route("/run", post(run_prediction))
        .route("/image", get(get_image))
        .route("/page/:page", post(goto_page))
        .route("/highlight", post(highlight))
        .route("/select", post(select))
        .route("/script", get(download_script))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct HighlightRequest {
    field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    field: String,
}

async fn get_view(State(state): State<AppState>) -> Json<PredictView> {
    Json(state.predict().view().await)
}

async fn reset(State(state): State<AppState>) -> Json<PredictView> {
    Json(state.predict().reset().await)
}

/// POST /api/v1/predict/file?name=form.pdf
///
/// The MIME type comes from `Content-Type`, or from the file name when the
/// client sent none or a generic one.
async fn load_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictView>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }

    let name = query.name.unwrap_or_else(|| "upload".to_string());
    let mime = upload_mime(&headers, &name);
    tracing::info!(name = %name, mime = %mime, size = body.len(), "Document uploaded");

    let view = state
        .predict()
        .load_file(&name, &mime, body.to_vec())
        .await?;
    Ok(Json(view))
}

async fn load_url(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<PredictView>> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("URL is required".to_string()));
    }
    Ok(Json(state.predict().load_url(url).await?))
}

async fn run_prediction(State(state): State<AppState>) -> Result<Json<PredictView>> {
    Ok(Json(state.predict().run_prediction().await?))
}

async fn get_image(State(state): State<AppState>) -> Result<Json<RenderedPage>> {
    state
        .predict()
        .image()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No document loaded".to_string()))
}

async fn goto_page(
    State(state): State<AppState>,
    Path(page): Path<u32>,
) -> Result<Json<PredictView>> {
    Ok(Json(state.predict().goto_page(page).await?))
}

async fn highlight(
    State(state): State<AppState>,
    Json(request): Json<HighlightRequest>,
) -> Json<PredictView> {
    Json(state.predict().highlight(request.field.as_deref()).await)
}

async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<PredictView>> {
    Ok(Json(state.predict().select(&request.field).await?))
}

async fn download_script(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let (file_name, content) = state.predict().analysis_script()?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/x-python; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        content,
    ))
}

fn upload_mime(headers: &HeaderMap, name: &str) -> String {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with("application/octet-stream"));

    match declared {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}
