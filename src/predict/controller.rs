//! Predict page controller

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::Instrument;
use uuid::Uuid;

use super::script::{render_script, script_file_name, DEFAULT_SCRIPT_TEMPLATE};
use super::session::{PredictSession, PredictView};
use crate::analyze::AnalyzeResult;
use crate::client::FormService;
use crate::document::{fetch_document, PageRenderer, RenderedPage, SourceDocument};
use crate::error::{AppError, Result};
use crate::overlay::TagPalette;
use crate::poller::{self, PollOptions, GENERIC_FAILURE_MESSAGE};
use crate::project::{Project, ProjectStore};

struct PredictInner {
    session: PredictSession,
    palette: TagPalette,
    project: watch::Receiver<Project>,
}

impl PredictInner {
    /// Rebuild the palette if the project's tags changed since the last look
    fn sync_palette(&mut self) {
        if self.project.has_changed().unwrap_or(false) {
            let palette = TagPalette::new(&self.project.borrow_and_update().tags);
            self.palette = palette;
            self.session.reproject(&self.palette);
            tracing::debug!(tags = self.palette.len(), "Tag palette rebuilt");
        }
    }

    fn view(&self) -> PredictView {
        self.session.view(&self.palette)
    }
}

pub struct PredictController {
    service: Arc<dyn FormService>,
    store: ProjectStore,
    renderer: PageRenderer,
    http: reqwest::Client,
    poll_options: PollOptions,
    script_template: String,
    generation: watch::Sender<u64>,
    inner: Mutex<PredictInner>,
}

impl PredictController {
    pub fn new(service: Arc<dyn FormService>, store: ProjectStore, poll_options: PollOptions) -> Self {
        let project = store.subscribe();
        let palette = TagPalette::new(&project.borrow().tags);
        let session = PredictSession::new();
        let (generation, _) = watch::channel(session.generation());

        Self {
            service,
            store,
            renderer: PageRenderer::default(),
            http: reqwest::Client::new(),
            poll_options,
            script_template: DEFAULT_SCRIPT_TEMPLATE.to_string(),
            generation,
            inner: Mutex::new(PredictInner {
                session,
                palette,
                project,
            }),
        }
    }

    pub fn with_script_template(mut self, template: String) -> Self {
        self.script_template = template;
        self
    }

    fn publish(&self, inner: &PredictInner) {
        self.generation.send_replace(inner.session.generation());
    }

    pub async fn view(&self) -> PredictView {
        let mut inner = self.inner.lock().await;
        inner.sync_palette();
        inner.view()
    }

    /// Current page raster, if a document is loaded
    pub async fn image(&self) -> Option<RenderedPage> {
        self.inner.lock().await.session.rendered().cloned()
    }

    /// Load uploaded bytes
    pub async fn load_file(&self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<PredictView> {
        let source = SourceDocument::local(name, mime, bytes)?;
        self.load(source).await
    }

    /// Fetch a document by URL and load it
    pub async fn load_url(&self, url: &str) -> Result<PredictView> {
        let source = fetch_document(&self.http, url).await?;
        self.load(source).await
    }

    /// Replace the current document and render its first page
    pub async fn load(&self, source: SourceDocument) -> Result<PredictView> {
        let document = {
            let mut inner = self.inner.lock().await;
            let document = inner.session.begin_load();
            self.publish(&inner);
            document
        };

        let page_count = self.renderer.page_count(&source).await?;
        if page_count == 0 {
            return Err(AppError::Render(format!("{} has no pages", source.name)));
        }
        let rendered = self.renderer.render(&source, 1).await?;

        tracing::info!(
            name = %source.name,
            kind = ?source.kind,
            page_count,
            "Document loaded"
        );

        let mut inner = self.inner.lock().await;
        inner.sync_palette();
        inner
            .session
            .finish_load(document, source, page_count, rendered)?;
        Ok(inner.view())
    }

    pub async fn goto_page(&self, page: u32) -> Result<PredictView> {
        let (document, source) = self.inner.lock().await.session.begin_page(page)?;

        let rendered = self.renderer.render(&source, page).await?;

        let mut inner = self.inner.lock().await;
        inner.sync_palette();
        let PredictInner {
            session, palette, ..
        } = &mut *inner;
        session.finish_page(document, rendered, palette)?;
        Ok(inner.view())
    }

    /// Analyze the loaded document with the trained model
    pub async fn run_prediction(&self) -> Result<PredictView> {
        let model_id = self
            .store
            .read()
            .model_id
            .filter(|id| !id.is_empty())
            .ok_or(AppError::PredictWithoutTrainForbidden)?;

        let ticket = {
            let mut inner = self.inner.lock().await;
            let ticket = inner.session.begin_prediction()?;
            self.publish(&inner);
            ticket
        };

        let span = tracing::info_span!(
            "predict",
            request_id = %Uuid::new_v4(),
            generation = ticket.generation,
            document = %ticket.source.name,
        );
        let superseded = wait_superseded(self.generation.subscribe(), ticket.generation);

        let outcome = tokio::select! {
            outcome = self.analyze(&model_id, &ticket.source).instrument(span) => outcome,
            _ = superseded => {
                tracing::info!(generation = ticket.generation, "Prediction superseded, polling stopped");
                Err(AppError::Superseded)
            }
        };

        let mut inner = self.inner.lock().await;
        inner.sync_palette();
        match outcome {
            Ok(result) => {
                let PredictInner {
                    session, palette, ..
                } = &mut *inner;
                session.complete_prediction(&ticket, result, palette)?;
            }
            Err(e) => {
                inner.session.fail_prediction(&ticket);
                return Err(e);
            }
        }

        Ok(inner.view())
    }

    async fn analyze(&self, model_id: &str, source: &SourceDocument) -> Result<AnalyzeResult> {
        let location = self.service.analyze(model_id, source).await?;
        let service = self.service.clone();

        let operation = poller::poll(
            || {
                let service = service.clone();
                let location = location.clone();
                async move { service.get_operation(&location).await }
            },
            self.poll_options,
        )
        .await?;

        let fields = operation
            .analyze_result
            .as_ref()
            .map_or(0, |r| r.fields().count());
        tracing::info!(fields, "Prediction succeeded");

        operation
            .analyze_result
            .ok_or_else(|| AppError::OperationFailed(GENERIC_FAILURE_MESSAGE.to_string()))
    }

    /// Mouse enter (`Some`) or leave (`None`)
    pub async fn highlight(&self, field: Option<&str>) -> PredictView {
        let mut inner = self.inner.lock().await;
        inner.session.set_highlight(field.unwrap_or_default());
        inner.view()
    }

    /// Click on a prediction row: show its page and highlight it
    pub async fn select(&self, field: &str) -> Result<PredictView> {
        let target = {
            let inner = self.inner.lock().await;
            let page = inner
                .session
                .field_page(field)
                .ok_or_else(|| AppError::NotFound(format!("No prediction for field {}", field)))?;
            (page != inner.session.current_page()).then_some(page)
        };

        if let Some(page) = target {
            self.goto_page(page).await?;
        }

        let mut inner = self.inner.lock().await;
        inner.session.set_highlight(field);
        Ok(inner.view())
    }

    /// Forget the document and any prediction in flight
    pub async fn reset(&self) -> PredictView {
        let mut inner = self.inner.lock().await;
        inner.session.clear();
        self.publish(&inner);
        inner.view()
    }

    /// Analysis script for the trained model as `(file name, content)`
    pub fn analysis_script(&self) -> Result<(String, String)> {
        let project = self.store.read();
        let model_id = project
            .model_id
            .filter(|id| !id.is_empty())
            .ok_or(AppError::PredictWithoutTrainForbidden)?;

        let content = render_script(
            &self.script_template,
            &project.api_uri_base,
            &project.api_key,
            &model_id,
        );
        Ok((script_file_name(&model_id), content))
    }
}

/// Resolves once the published generation differs from `generation`
async fn wait_superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    let changed = rx.wait_for(|current| *current != generation).await.is_ok();
    if !changed {
        std::future::pending::<()>().await;
    }
}
