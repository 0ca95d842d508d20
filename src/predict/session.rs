//! Predict page state
//!
//! Plain state machine without I/O. The controller performs rendering and
//! remote calls between a `begin_*` and the matching `finish_*`/`complete_*`
//! call, and the counters kept here decide whether a late result still
//! applies.

use std::sync::{Arc, Weak};

use serde::Serialize;

use crate::analyze::AnalyzeResult;
use crate::document::{DocumentKind, RenderedPage, SourceDocument, SourceOrigin};
use crate::error::{AppError, Result};
use crate::overlay::{self, OverlayFeature, TagPalette};

/// Claim on the outcome of one prediction run
///
/// The session reports a run in flight only while its ticket is alive, so a
/// dropped or aborted run never leaves the page stuck in "predicting".
#[derive(Debug)]
pub struct PredictTicket {
    pub generation: u64,
    pub source: SourceDocument,
    _running: Arc<()>,
}

/// One row of the result panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    pub field_name: String,
    pub text: Option<String>,
    pub confidence: Option<f64>,
    pub page: Option<u32>,
    pub color: String,
}

/// Overlay feature with its outline width
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureView {
    #[serde(flatten)]
    pub feature: OverlayFeature,
    pub stroke_width: u32,
}

/// What the predict page displays; the page image is served separately
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictView {
    pub file_label: Option<String>,
    pub origin: Option<SourceOrigin>,
    pub kind: Option<DocumentKind>,
    pub current_page: u32,
    pub page_count: u32,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub is_predicting: bool,
    pub predict_run: bool,
    pub highlighted_field: String,
    pub features: Vec<FeatureView>,
    pub predictions: Vec<PredictionRow>,
}

#[derive(Debug, Default)]
pub struct PredictSession {
    source: Option<SourceDocument>,
    page_count: u32,
    current_page: u32,
    rendered: Option<RenderedPage>,
    result: Option<AnalyzeResult>,
    highlighted: String,
    features: Vec<OverlayFeature>,
    /// Bumped whenever a pending prediction stops being wanted
    generation: u64,
    /// Bumped whenever the loaded document changes
    document: u64,
    /// Alive while the ticket of the current run is held
    in_flight: Weak<()>,
}

impl PredictSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rendered(&self) -> Option<&RenderedPage> {
        self.rendered.as_ref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn features(&self) -> &[OverlayFeature] {
        &self.features
    }

    pub fn result(&self) -> Option<&AnalyzeResult> {
        self.result.as_ref()
    }

    pub fn is_predicting(&self) -> bool {
        self.in_flight.strong_count() > 0
    }

    /// Drop the current document and anything derived from it.
    ///
    /// Returns the document counter the matching [`finish_load`] must present.
    ///
    /// [`finish_load`]: PredictSession::finish_load
    pub fn begin_load(&mut self) -> u64 {
        self.clear();
        self.document
    }

    pub fn finish_load(
        &mut self,
        document: u64,
        source: SourceDocument,
        page_count: u32,
        rendered: RenderedPage,
    ) -> Result<()> {
        if document != self.document {
            return Err(AppError::Superseded);
        }

        self.source = Some(source);
        self.page_count = page_count;
        self.current_page = rendered.page;
        self.rendered = Some(rendered);
        Ok(())
    }

    /// Validate a page change; returns the document counter and the source to render
    pub fn begin_page(&self, page: u32) -> Result<(u64, SourceDocument)> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| AppError::BadRequest("No document loaded".to_string()))?;

        if page == 0 || page > self.page_count {
            return Err(AppError::BadRequest(format!(
                "Page {} is out of range 1..={}",
                page, self.page_count
            )));
        }

        Ok((self.document, source))
    }

    pub fn finish_page(
        &mut self,
        document: u64,
        rendered: RenderedPage,
        palette: &TagPalette,
    ) -> Result<()> {
        if document != self.document {
            return Err(AppError::Superseded);
        }

        self.current_page = rendered.page;
        self.rendered = Some(rendered);
        self.reproject(palette);
        Ok(())
    }

    /// Start a prediction run, invalidating any run still in flight
    pub fn begin_prediction(&mut self) -> Result<PredictTicket> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| AppError::BadRequest("No document loaded".to_string()))?;

        self.generation += 1;
        self.result = None;
        self.features.clear();

        let running = Arc::new(());
        self.in_flight = Arc::downgrade(&running);

        Ok(PredictTicket {
            generation: self.generation,
            source,
            _running: running,
        })
    }

    /// Store the result of a run if its ticket is still current
    pub fn complete_prediction(
        &mut self,
        ticket: &PredictTicket,
        result: AnalyzeResult,
        palette: &TagPalette,
    ) -> Result<()> {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale prediction result"
            );
            return Err(AppError::Superseded);
        }

        self.in_flight = Weak::new();
        self.result = Some(result);
        self.reproject(palette);
        Ok(())
    }

    pub fn fail_prediction(&mut self, ticket: &PredictTicket) {
        if ticket.generation == self.generation {
            self.in_flight = Weak::new();
        }
    }

    /// Mouse enter/leave on a feature or a result row
    pub fn set_highlight(&mut self, field: &str) {
        self.highlighted = field.to_string();
        overlay::set_highlight(&mut self.features, field);
    }

    /// Page a predicted field lives on
    pub fn field_page(&self, field: &str) -> Option<u32> {
        self.result
            .as_ref()?
            .fields()
            .find(|(name, _)| overlay::is_same_field(name, field))
            .and_then(|(_, prediction)| prediction.page)
    }

    /// Recompute the overlay from the result, the rendered page and the palette
    pub fn reproject(&mut self, palette: &TagPalette) {
        self.features = match (&self.result, &self.rendered) {
            (Some(result), Some(rendered)) => overlay::project(
                result,
                self.current_page,
                rendered.extent(),
                palette,
                &self.highlighted,
            ),
            _ => Vec::new(),
        };
    }

    pub fn predictions(&self, palette: &TagPalette) -> Vec<PredictionRow> {
        let Some(result) = &self.result else {
            return Vec::new();
        };

        let mut rows: Vec<PredictionRow> = result
            .fields()
            .map(|(name, prediction)| PredictionRow {
                field_name: name.to_string(),
                text: prediction.display_text().map(str::to_string),
                confidence: prediction.confidence,
                page: prediction.page,
                color: palette.color_for(name).to_string(),
            })
            .collect();
        rows.sort_by(|a, b| a.field_name.cmp(&b.field_name));
        rows
    }

    /// Forget the document, the result and any run in flight
    pub fn clear(&mut self) {
        self.source = None;
        self.page_count = 0;
        self.current_page = 0;
        self.rendered = None;
        self.result = None;
        self.highlighted.clear();
        self.features.clear();
        self.in_flight = Weak::new();
        self.generation += 1;
        self.document += 1;
    }

    pub fn view(&self, palette: &TagPalette) -> PredictView {
        PredictView {
            file_label: self.source.as_ref().map(|s| s.name.clone()),
            origin: self.source.as_ref().map(|s| s.origin.clone()),
            kind: self.source.as_ref().map(|s| s.kind),
            current_page: self.current_page,
            page_count: self.page_count,
            image_width: self.rendered.as_ref().map(|r| r.width),
            image_height: self.rendered.as_ref().map(|r| r.height),
            is_predicting: self.is_predicting(),
            predict_run: self.result.is_some(),
            highlighted_field: self.highlighted.clone(),
            features: self
                .features
                .iter()
                .map(|feature| FeatureView {
                    stroke_width: feature.stroke_width(),
                    feature: feature.clone(),
                })
                .collect(),
            predictions: self.predictions(palette),
        }
    }
}
