//! Project store
//!
//! Shared, observable project state (service credentials, trained model, tag
//! palette). Readers take snapshots with [`ProjectStore::read`], observers hold a
//! [`watch::Receiver`] from [`ProjectStore::subscribe`], and all changes go
//! through [`ProjectStore::dispatch`].

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::Config;

/// A labeling tag and its display color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub color: String,
}

/// Project state shared by the compose and predict pages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub api_uri_base: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Model produced by the last training run
    pub model_id: Option<String>,
    pub tags: Vec<Tag>,
}

impl Project {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_uri_base: config.service.api_uri_base.clone(),
            api_key: config.service.api_key.clone(),
            model_id: config.project.model_id.clone(),
            tags: config.project.tags.clone(),
        }
    }
}

/// State changes accepted by the store
#[derive(Debug, Clone)]
pub enum ProjectAction {
    SetTags(Vec<Tag>),
    SetModel(Option<String>),
}

/// Observable holder for the current [`Project`]
#[derive(Clone)]
pub struct ProjectStore {
    tx: watch::Sender<Project>,
}

impl ProjectStore {
    pub fn new(project: Project) -> Self {
        let (tx, _rx) = watch::channel(project);
        Self { tx }
    }

    /// Snapshot of the current project
    pub fn read(&self) -> Project {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every dispatched change
    pub fn subscribe(&self) -> watch::Receiver<Project> {
        self.tx.subscribe()
    }

    pub fn dispatch(&self, action: ProjectAction) {
        tracing::debug!(?action, "Dispatching project action");
        self.tx.send_modify(|project| match action {
            ProjectAction::SetTags(tags) => project.tags = tags,
            ProjectAction::SetModel(model_id) => project.model_id = model_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            api_uri_base: "http://localhost/".to_string(),
            api_key: "key".to_string(),
            model_id: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_dispatch_notifies_subscribers() {
        let store = ProjectStore::new(project());
        let mut rx = store.subscribe();

        store.dispatch(ProjectAction::SetTags(vec![Tag {
            name: "Total".to_string(),
            color: "#ff0000".to_string(),
        }]));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().tags.len(), 1);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_set_model() {
        let store = ProjectStore::new(project());
        store.dispatch(ProjectAction::SetModel(Some("abc".to_string())));
        assert_eq!(store.read().model_id.as_deref(), Some("abc"));
    }
}
