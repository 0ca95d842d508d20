//! Source documents
//!
//! Loading, fetching and page rendering for the documents submitted for
//! prediction. JPEG and PNG are decoded with `image`; PDF and (multi-page) TIFF
//! go through MuPDF.

mod error;
mod fetch;
mod renderer;
mod types;

pub use error::{DocumentError, DocumentResult};
pub use fetch::{fetch_document, ACCEPTED_CONTENT_TYPES};
pub use renderer::PageRenderer;
pub use types::{DocumentKind, RenderedPage, SourceDocument, SourceOrigin};
