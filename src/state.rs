//! Application state management

use std::sync::Arc;

use crate::client::{ClientError, FormService, HttpFormService};
use crate::compose::ComposeController;
use crate::config::Config;
use crate::poller::PollOptions;
use crate::predict::PredictController;
use crate::project::{Project, ProjectStore};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize form service client: {0}")]
    Client(#[from] ClientError),

    #[error("Failed to read analysis script template {path}: {source}")]
    ScriptTemplate {
        path: String,
        source: std::io::Error,
    },
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: ProjectStore,
    predict: PredictController,
    compose: ComposeController,
}

impl AppState {
    /// Create the state with the REST client for the configured service
    pub async fn new(config: Config) -> Result<Self, StateError> {
        let service = HttpFormService::new(&config.service)?;
        Self::with_service(config, Arc::new(service)).await
    }

    /// Create the state around any [`FormService`] implementation
    pub async fn with_service(
        config: Config,
        service: Arc<dyn FormService>,
    ) -> Result<Self, StateError> {
        let store = ProjectStore::new(Project::from_config(&config));
        let poll_options = PollOptions::new(config.polling.timeout(), config.polling.interval());

        let mut predict = PredictController::new(service.clone(), store.clone(), poll_options);
        if let Some(path) = &config.project.analyze_script_path {
            let template = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| StateError::ScriptTemplate {
                    path: path.display().to_string(),
                    source,
                })?;
            tracing::info!(path = %path.display(), "Using custom analysis script template");
            predict = predict.with_script_template(template);
        }

        let compose = ComposeController::new(service, poll_options);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                predict,
                compose,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the project store
    pub fn store(&self) -> &ProjectStore {
        &self.inner.store
    }

    pub fn predict(&self) -> &PredictController {
        &self.inner.predict
    }

    pub fn compose(&self) -> &ComposeController {
        &self.inner.compose
    }
}
