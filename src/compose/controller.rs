//! Compose page controller

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::Mutex;

use super::sort::{copy_and_sort, ColumnState, ModelColumn, SortState};
use crate::client::{ComposeRequest, FormService, ModelInfo};
use crate::error::{AppError, Result};
use crate::poller::{self, PollOptions};

/// What the compose page displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeView {
    pub models: Vec<ModelInfo>,
    pub columns: Vec<ColumnState>,
    pub is_composing: bool,
}

#[derive(Default)]
struct ComposeState {
    models: Vec<ModelInfo>,
    sort: SortState,
    /// Alive while a compose call holds its token
    composing: Weak<()>,
}

impl ComposeState {
    fn is_composing(&self) -> bool {
        self.composing.strong_count() > 0
    }
}

pub struct ComposeController {
    service: Arc<dyn FormService>,
    poll_options: PollOptions,
    state: Mutex<ComposeState>,
}

impl ComposeController {
    pub fn new(service: Arc<dyn FormService>, poll_options: PollOptions) -> Self {
        Self {
            service,
            poll_options,
            state: Mutex::new(ComposeState::default()),
        }
    }

    pub async fn view(&self) -> ComposeView {
        let state = self.state.lock().await;
        ComposeView {
            models: state.models.clone(),
            columns: state.sort.columns().to_vec(),
            is_composing: state.is_composing(),
        }
    }

    /// Reload the model list, keeping the current sort
    pub async fn refresh(&self) -> Result<ComposeView> {
        let models = self.service.list_models().await?;

        {
            let mut state = self.state.lock().await;
            state.models = state.sort.apply(&models);
        }

        tracing::info!(count = models.len(), "Model list refreshed");
        Ok(self.view().await)
    }

    /// Column header click
    pub async fn click_column(&self, column: ModelColumn) -> ComposeView {
        {
            let mut state = self.state.lock().await;
            let descending = state.sort.click(column);
            state.models = copy_and_sort(&state.models, column, descending);
            tracing::debug!(?column, descending, "Sorted model list");
        }
        self.view().await
    }

    /// Compose the selected models and wait for the new model to be ready
    pub async fn compose(&self, model_ids: Vec<String>, model_name: Option<String>) -> Result<ModelInfo> {
        let mut model_ids = model_ids;
        let mut seen = HashSet::new();
        model_ids.retain(|id| seen.insert(id.clone()));
        if model_ids.len() < 2 {
            return Err(AppError::BadRequest(
                "Select at least two models to compose".to_string(),
            ));
        }

        // Dropping this call, aborted or not, releases the token
        let _running = {
            let mut state = self.state.lock().await;
            if state.is_composing() {
                return Err(AppError::Conflict("A compose is already running".to_string()));
            }
            let running = Arc::new(());
            state.composing = Arc::downgrade(&running);
            running
        };

        tracing::info!(models = ?model_ids, "Composing models");
        let request = ComposeRequest {
            model_ids,
            model_name,
        };
        let outcome = self.run_compose(&request).await;

        self.state.lock().await.composing = Weak::new();

        let composed = outcome?;
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Failed to refresh model list after compose");
        }

        tracing::info!(model_id = %composed.model_id, "Compose finished");
        Ok(composed)
    }

    async fn run_compose(&self, request: &ComposeRequest) -> Result<ModelInfo> {
        let location = self.service.compose_models(request).await?;
        let service = self.service.clone();

        let composed = poller::poll(
            || {
                let service = service.clone();
                let location = location.clone();
                async move { service.get_model(&location).await }
            },
            self.poll_options,
        )
        .await?;

        Ok(composed)
    }
}
