//! Project routes
//!
//! Endpoints:
//! - GET /api/v1/project - Current project state
//! - PUT /api/v1/project/tags - Replace the tag palette
//! - PUT /api/v1/project/model - Set or clear the trained model

use axum::{extract::State, routing::{get, put}, Json, Router};
use serde::Deserialize;

use crate::project::{Project, ProjectAction, Tag};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_project))
        .route("/tags", put(set_tags))
        .route("/model", put(set_model))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetModelRequest {
    model_id: Option<String>,
}

async fn get_project(State(state): State<AppState>) -> Json<Project> {
    Json(state.store().read())
}

async fn set_tags(State(state): State<AppState>, Json(tags): Json<Vec<Tag>>) -> Json<Project> {
    tracing::info!(count = tags.len(), "Updating project tags");
    state.store().dispatch(ProjectAction::SetTags(tags));
    Json(state.store().read())
}

async fn set_model(
    State(state): State<AppState>,
    Json(request): Json<SetModelRequest>,
) -> Json<Project> {
    let model_id = request.model_id.filter(|id| !id.trim().is_empty());
    tracing::info!(model_id = ?model_id, "Updating trained model");
    state.store().dispatch(ProjectAction::SetModel(model_id));
    Json(state.store().read())
}
