//! Document error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// MIME type of a local file outside the supported set
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Content-Type of a fetched resource outside the accepted set
    #[error("Content-Type {0} not supported")]
    UnsupportedContentType(String),

    /// Remote resource answered with a non-success status
    #[error("Failed to fetch: {0}")]
    FetchFailed(String),

    /// Transport failure while fetching
    #[error("Network error: {0}")]
    Network(String),

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Load(err.to_string())
    }
}
