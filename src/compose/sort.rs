//! Model list column sorting

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ModelInfo;

/// Sortable columns of the model list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelColumn {
    #[serde(rename = "modelId")]
    ModelId,
    Status,
    #[serde(rename = "createdatetime")]
    CreatedDateTime,
    #[serde(rename = "lastupdateddatetime")]
    LastUpdatedDateTime,
}

impl ModelColumn {
    pub const ALL: [ModelColumn; 4] = [
        ModelColumn::ModelId,
        ModelColumn::Status,
        ModelColumn::CreatedDateTime,
        ModelColumn::LastUpdatedDateTime,
    ];

    /// Column header shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            ModelColumn::ModelId => "Model ID",
            ModelColumn::Status => "Status",
            ModelColumn::CreatedDateTime => "Create Date Time",
            ModelColumn::LastUpdatedDateTime => "Last Updated Date Time",
        }
    }

    fn compare(&self, a: &ModelInfo, b: &ModelInfo) -> Ordering {
        match self {
            ModelColumn::ModelId => a.model_id.cmp(&b.model_id),
            ModelColumn::Status => a.status.cmp(&b.status),
            ModelColumn::CreatedDateTime => a.created_date_time.cmp(&b.created_date_time),
            ModelColumn::LastUpdatedDateTime => {
                a.last_updated_date_time.cmp(&b.last_updated_date_time)
            }
        }
    }
}

impl FromStr for ModelColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modelid" => Ok(ModelColumn::ModelId),
            "status" => Ok(ModelColumn::Status),
            "createdatetime" | "createddatetime" => Ok(ModelColumn::CreatedDateTime),
            "lastupdateddatetime" => Ok(ModelColumn::LastUpdatedDateTime),
            other => Err(format!("Unknown column: {}", other)),
        }
    }
}

/// Sort flags of one column header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnState {
    pub column: ModelColumn,
    pub title: &'static str,
    pub is_sorted: bool,
    pub is_sorted_descending: bool,
}

/// Header state of all columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    columns: Vec<ColumnState>,
}

impl Default for SortState {
    /// Model ID ascending
    fn default() -> Self {
        let columns = ModelColumn::ALL
            .iter()
            .map(|&column| ColumnState {
                column,
                title: column.title(),
                is_sorted: column == ModelColumn::ModelId,
                is_sorted_descending: false,
            })
            .collect();
        Self { columns }
    }
}

impl SortState {
    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    /// The sorted column and its direction
    pub fn active(&self) -> Option<(ModelColumn, bool)> {
        self.columns
            .iter()
            .find(|c| c.is_sorted)
            .map(|c| (c.column, c.is_sorted_descending))
    }

    /// Header click: the clicked column flips direction and becomes the sorted
    /// one; every other column resets to unsorted, descending next time.
    pub fn click(&mut self, column: ModelColumn) -> bool {
        let mut descending = false;
        for state in &mut self.columns {
            if state.column == column {
                state.is_sorted_descending = !state.is_sorted_descending;
                state.is_sorted = true;
                descending = state.is_sorted_descending;
            } else {
                state.is_sorted = false;
                state.is_sorted_descending = true;
            }
        }
        descending
    }

    /// Sorted copy of `models` according to the active column
    pub fn apply(&self, models: &[ModelInfo]) -> Vec<ModelInfo> {
        match self.active() {
            Some((column, descending)) => copy_and_sort(models, column, descending),
            None => models.to_vec(),
        }
    }
}

/// Stable sort of a copy; date columns compare timestamps, the rest compare text
pub fn copy_and_sort(models: &[ModelInfo], column: ModelColumn, descending: bool) -> Vec<ModelInfo> {
    let mut sorted = models.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = column.compare(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn model(id: &str, status: &str, created: i64, updated: i64) -> ModelInfo {
        ModelInfo {
            model_id: id.to_string(),
            status: status.to_string(),
            created_date_time: Utc.timestamp_opt(created, 0).unwrap(),
            last_updated_date_time: Utc.timestamp_opt(updated, 0).unwrap(),
            model_name: None,
        }
    }

    fn ids(models: &[ModelInfo]) -> Vec<&str> {
        models.iter().map(|m| m.model_id.as_str()).collect()
    }

    fn models() -> Vec<ModelInfo> {
        vec![
            model("b", "ready", 300, 100),
            model("a", "invalid", 100, 300),
            model("c", "creating", 200, 200),
        ]
    }

    #[test]
    fn test_sort_by_date_uses_own_column() {
        let models = models();

        assert_eq!(ids(&copy_and_sort(&models, ModelColumn::CreatedDateTime, false)), vec!["a", "c", "b"]);
        assert_eq!(ids(&copy_and_sort(&models, ModelColumn::LastUpdatedDateTime, false)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_lexical_columns() {
        let models = models();

        assert_eq!(ids(&copy_and_sort(&models, ModelColumn::ModelId, true)), vec!["c", "b", "a"]);
        assert_eq!(ids(&copy_and_sort(&models, ModelColumn::Status, false)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_descending_then_ascending_restores_order() {
        let models = models();
        let ascending = copy_and_sort(&models, ModelColumn::CreatedDateTime, false);

        let descending = copy_and_sort(&ascending, ModelColumn::CreatedDateTime, true);
        let restored = copy_and_sort(&descending, ModelColumn::CreatedDateTime, false);

        assert_eq!(ids(&descending), vec!["b", "c", "a"]);
        assert_eq!(restored, ascending);
    }

    #[test]
    fn test_sort_is_stable() {
        let models = vec![
            model("x", "ready", 1, 1),
            model("y", "ready", 1, 1),
            model("z", "ready", 1, 1),
        ];

        assert_eq!(ids(&copy_and_sort(&models, ModelColumn::Status, true)), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_click_toggles() {
        let mut state = SortState::default();
        assert_eq!(state.active(), Some((ModelColumn::ModelId, false)));

        // Untouched column starts descending
        assert!(state.click(ModelColumn::Status));
        assert_eq!(state.active(), Some((ModelColumn::Status, true)));

        // Same column flips
        assert!(!state.click(ModelColumn::Status));

        // Columns reset by another click start ascending
        assert!(!state.click(ModelColumn::ModelId));
        let status = state.columns().iter().find(|c| c.column == ModelColumn::Status).unwrap();
        assert!(!status.is_sorted);
        assert!(status.is_sorted_descending);
    }

    #[test]
    fn test_parse_column() {
        assert_eq!("createdatetime".parse::<ModelColumn>(), Ok(ModelColumn::CreatedDateTime));
        assert_eq!("modelId".parse::<ModelColumn>(), Ok(ModelColumn::ModelId));
        assert!("size".parse::<ModelColumn>().is_err());
    }
}
