//! Form service trait and HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, Url};

use super::error::ClientError;
use super::retry::{RetryPolicy, SendFailure};
use super::types::{ComposeRequest, ModelInfo, ModelInfoResponse, ModelListResponse};
use crate::analyze::AnalyzeOperation;
use crate::config::ServiceConfig;
use crate::document::SourceDocument;

/// Subscription key header expected by the service
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

const OPERATION_LOCATION: &str = "operation-location";

/// Remote form analysis service
#[async_trait]
pub trait FormService: Send + Sync {
    /// List the custom models of the account
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError>;

    /// Submit a document for analysis; returns the operation location
    async fn analyze(&self, model_id: &str, source: &SourceDocument) -> Result<String, ClientError>;

    /// Current state of an analyze operation
    async fn get_operation(&self, operation_location: &str) -> Result<AnalyzeOperation, ClientError>;

    /// Start composing models; returns the location of the new model
    async fn compose_models(&self, request: &ComposeRequest) -> Result<String, ClientError>;

    /// Current state of a model, by location
    async fn get_model(&self, model_location: &str) -> Result<ModelInfo, ClientError>;
}

/// REST implementation of [`FormService`]
pub struct HttpFormService {
    http: reqwest::Client,
    models_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpFormService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &ServiceConfig) -> Result<Self, ClientError> {
        let mut base = config.api_uri_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let mut models_path = config.models_path.trim_matches('/').to_string();
        models_path.push('/');

        let models_url = Url::parse(&base)
            .and_then(|b| b.join(&models_path))
            .map_err(|e| ClientError::InvalidUrl(format!("{}{}: {}", base, models_path, e)))?;

        Ok(Self {
            http,
            models_url,
            api_key: config.api_key.clone(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_base_delay_ms),
            ),
        })
    }

    /// `{models}` or `{models}/{segments...}`
    fn models_endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.models_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn analyze_url(&self, model_id: &str) -> Url {
        let mut url = self.models_endpoint(&[model_id, "analyze"]);
        url.query_pairs_mut().append_pair("includeTextDetails", "true");
        url
    }

    pub async fn get_with_auto_retry(&self, url: &str) -> Result<Response, ClientError> {
        let url = Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.send_with_auto_retry(self.http.get(url)).await
    }

    pub async fn post_with_auto_retry(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        self.send_with_auto_retry(request).await
    }

    async fn send_with_auto_retry(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(CACHE_CONTROL, "no-cache");

        let attempt = || {
            let current = request.try_clone();
            async move {
                let current = current.ok_or(SendFailure::NotCloneable)?;
                match current.send().await {
                    Ok(response) if response.status().is_success() => Ok(response),
                    Ok(response) => Err(SendFailure::Status(response)),
                    Err(e) => Err(SendFailure::Transport(e)),
                }
            }
        };

        let outcome = attempt
            .retry(self.retry.backoff())
            .when(SendFailure::is_transient)
            .adjust(|failure: &SendFailure, delay: Option<Duration>| {
                delay.map(|delay| failure.retry_after().unwrap_or(delay))
            })
            .notify(|failure: &SendFailure, delay: Duration| {
                tracing::warn!(
                    error = %failure,
                    delay_ms = delay.as_millis() as u64,
                    "Transient service failure, retrying"
                );
            })
            .await;

        match outcome {
            Ok(response) => Ok(response),
            Err(SendFailure::Status(response)) => Err(handle_service_error(response).await),
            Err(SendFailure::Transport(e)) => Err(ClientError::Network(e)),
            Err(failure @ SendFailure::NotCloneable) => {
                Err(ClientError::InvalidResponse(failure.to_string()))
            }
        }
    }
}

#[async_trait]
impl FormService for HttpFormService {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let url = self.models_endpoint(&[]);
        let response = self.send_with_auto_retry(self.http.get(url)).await?;
        let list: ModelListResponse = response.json().await?;

        tracing::debug!(count = list.model_list.len(), "Listed models");
        Ok(list.model_list)
    }

    async fn analyze(&self, model_id: &str, source: &SourceDocument) -> Result<String, ClientError> {
        let url = self.analyze_url(model_id);
        let request = match source.source_url() {
            Some(source_url) => self
                .http
                .post(url)
                .json(&serde_json::json!({ "source": source_url })),
            None => self
                .http
                .post(url)
                .header(CONTENT_TYPE, source.mime_type())
                .body(source.bytes.as_ref().clone()),
        };

        let response = self.post_with_auto_retry(request).await?;
        let location = header_value(&response, OPERATION_LOCATION)?;

        tracing::info!(model_id, document = %source.name, %location, "Analyze operation started");
        Ok(location)
    }

    async fn get_operation(&self, operation_location: &str) -> Result<AnalyzeOperation, ClientError> {
        let response = self.get_with_auto_retry(operation_location).await?;
        Ok(response.json().await?)
    }

    async fn compose_models(&self, request: &ComposeRequest) -> Result<String, ClientError> {
        let url = self.models_endpoint(&["compose"]);
        let response = self
            .post_with_auto_retry(self.http.post(url).json(request))
            .await?;

        header_value(&response, "location")
    }

    async fn get_model(&self, model_location: &str) -> Result<ModelInfo, ClientError> {
        let response = self.get_with_auto_retry(model_location).await?;
        let info: ModelInfoResponse = response.json().await?;
        Ok(info.model_info)
    }
}

async fn handle_service_error(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let err = ClientError::from_service_response(status, &body);
    tracing::error!(status = status.as_u16(), error = %err, "Service request failed");
    err
}

fn header_value(response: &Response, name: &'static str) -> Result<String, ClientError> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(ClientError::MissingHeader(name))
}
