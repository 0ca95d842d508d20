//! Model management wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::poller::{PollState, Pollable};

/// A trained (or composed) custom model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_id: String,
    pub status: String,
    pub created_date_time: DateTime<Utc>,
    pub last_updated_date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl Pollable for ModelInfo {
    fn poll_state(&self) -> PollState {
        if self.status.eq_ignore_ascii_case("ready") {
            PollState::Succeeded
        } else if self.status.eq_ignore_ascii_case("invalid") {
            PollState::Failed(Some(format!("Model {} is invalid", self.model_id)))
        } else {
            PollState::Pending
        }
    }
}

/// `GET {models}` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListResponse {
    #[serde(default)]
    pub model_list: Vec<ModelInfo>,
}

/// `GET {models}/{id}` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfoResponse {
    pub model_info: ModelInfo,
}

/// `POST {models}/compose` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    pub model_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_model_list() {
        let list: ModelListResponse = serde_json::from_value(json!({
            "summary": {"count": 1},
            "modelList": [{
                "modelId": "f2f1c4ad",
                "status": "ready",
                "createdDateTime": "2020-04-09T19:07:52Z",
                "lastUpdatedDateTime": "2020-04-09T19:08:10Z"
            }]
        }))
        .unwrap();

        assert_eq!(list.model_list.len(), 1);
        assert_eq!(list.model_list[0].poll_state(), PollState::Succeeded);
    }

    #[test]
    fn test_model_status_states() {
        let mut model: ModelInfo = serde_json::from_value(json!({
            "modelId": "m",
            "status": "creating",
            "createdDateTime": "2020-04-09T19:07:52Z",
            "lastUpdatedDateTime": "2020-04-09T19:07:52Z"
        }))
        .unwrap();
        assert_eq!(model.poll_state(), PollState::Pending);

        model.status = "Invalid".to_string();
        assert!(matches!(model.poll_state(), PollState::Failed(Some(_))));
    }
}
