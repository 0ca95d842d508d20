//! Formscope Server Library
//!
//! Backend of a form labeling tool: predicts fields of a document with a
//! trained model and composes trained models, against a remote form analysis
//! service. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `poller`: Long-running operation polling
//! - `overlay`: Projection of predicted bounding boxes onto rendered pages
//! - `predict`: Predict page state and controller
//! - `compose`: Model list sorting and composition
//! - `client`: REST client of the analysis service
//! - `document`: Source documents, fetching and page rendering

pub mod analyze;
pub mod client;
pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod overlay;
pub mod poller;
pub mod predict;
pub mod project;
pub mod routes;
pub mod state;
