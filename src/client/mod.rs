//! Form analysis service client
//!
//! [`FormService`] is the seam between the pages and the remote service:
//! [`HttpFormService`] talks to the real REST API with retry-with-backoff, tests
//! substitute an in-memory implementation.

mod error;
mod retry;
mod service;
mod types;

pub use error::ClientError;
pub use retry::RetryPolicy;
pub use service::{FormService, HttpFormService, API_KEY_HEADER};
pub use types::{ComposeRequest, ModelInfo, ModelInfoResponse, ModelListResponse};
