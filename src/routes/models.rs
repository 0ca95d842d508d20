//! Model compose routes
//!
//! Endpoints:
//! - GET /api/v1/models - Current model list and column sort state
//! - POST /api/v1/models/refresh - Reload the model list
//! - POST /api/v1/models/sort/:column - Column header click
//! - POST /api/v1/models/compose - Compose selected models

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::client::ModelInfo;
use crate::compose::{ComposeView, ModelColumn};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models))
        .route("/refresh", post(refresh_models))
        .route("/sort/:column", post(sort_models))
        .route("/compose", post(compose_models))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComposeModelsRequest {
    model_ids: Vec<String>,
    #[serde(default)]
    model_name: Option<String>,
}

async fn list_models(State(state): State<AppState>) -> Json<ComposeView> {
    Json(state.compose().view().await)
}

async fn refresh_models(State(state): State<AppState>) -> Result<Json<ComposeView>> {
    Ok(Json(state.compose().refresh().await?))
}

async fn sort_models(
    State(state): State<AppState>,
    Path(column): Path<String>,
) -> Result<Json<ComposeView>> {
    let column: ModelColumn = column.parse().map_err(AppError::BadRequest)?;
    Ok(Json(state.compose().click_column(column).await))
}

/// POST /api/v1/models/compose
///
/// Returns once the composed model is ready.
async fn compose_models(
    State(state): State<AppState>,
    Json(request): Json<ComposeModelsRequest>,
) -> Result<(StatusCode, Json<ModelInfo>)> {
    let composed = state
        .compose()
        .compose(request.model_ids, request.model_name)
        .await?;
    Ok((StatusCode::CREATED, Json(composed)))
}
