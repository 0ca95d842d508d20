//! Predict page
//!
//! Loads a document, renders the current page, runs the trained model against
//! it and keeps the overlay of predicted fields in sync with page and
//! highlight changes.

mod controller;
mod script;
mod session;

pub use controller::PredictController;
pub use script::{render_script, script_file_name, DEFAULT_SCRIPT_TEMPLATE};
pub use session::{FeatureView, PredictSession, PredictTicket, PredictView, PredictionRow};
