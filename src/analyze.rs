//! Analyze operation payloads
//!
//! Wire types of the remote service's operation-status endpoint. Only the
//! parts the predict page consumes are modeled; everything else is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::poller::{PollState, Pollable};

/// `GET {operation-location}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOperation {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze_result: Option<AnalyzeResult>,
}

impl Pollable for AnalyzeOperation {
    fn poll_state(&self) -> PollState {
        match PollState::from_status(&self.status) {
            PollState::Failed(_) => PollState::Failed(self.error_message()),
            state => state,
        }
    }
}

impl AnalyzeOperation {
    /// Message of the first reported error, if the service sent one
    pub fn error_message(&self) -> Option<String> {
        self.analyze_result
            .as_ref()?
            .errors
            .first()
            .and_then(|e| e.error_message.clone().or_else(|| e.message.clone()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub read_results: Vec<PageOcrResult>,
    #[serde(default)]
    pub document_results: Vec<DocumentResult>,
    #[serde(default)]
    pub errors: Vec<ServiceErrorDetail>,
}

impl AnalyzeResult {
    /// OCR reference frame of a 1-based page
    pub fn page_frame(&self, page: u32) -> Option<&PageOcrResult> {
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        self.read_results.get(index)
    }

    /// Field predictions of the first document result
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldPrediction)> {
        self.document_results
            .first()
            .into_iter()
            .flat_map(|doc| doc.fields.iter())
            .filter_map(|(name, field)| field.as_ref().map(|f| (name.as_str(), f)))
    }
}

/// Per-page OCR result; `width`/`height` are in the service's units
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOcrResult {
    #[serde(default)]
    pub page: Option<u32>,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    #[serde(default)]
    pub doc_type: Option<String>,
    /// The service reports fields it could not find as `null`
    #[serde(default)]
    pub fields: BTreeMap<String, Option<FieldPrediction>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPrediction {
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value_string: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Four x/y corner pairs, origin bottom-left
    #[serde(default)]
    pub bounding_box: Option<Vec<f64>>,
}

impl FieldPrediction {
    /// Display text of the predicted value
    pub fn display_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.value_string.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}
