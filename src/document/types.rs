//! Document types

use std::sync::Arc;

use serde::Serialize;

use super::error::{DocumentError, DocumentResult};
use crate::overlay::PageExtent;

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Jpeg,
    Png,
    Tiff,
    Pdf,
}

impl DocumentKind {
    /// Map a MIME type to a document kind; parameters such as `; charset=` are ignored
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/tiff" => Some(Self::Tiff),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether the format can hold more than one page
    pub fn is_paged(&self) -> bool {
        matches!(self, Self::Tiff | Self::Pdf)
    }
}

/// Where a source document came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "url", rename_all = "camelCase")]
pub enum SourceOrigin {
    LocalFile,
    Url(String),
}

/// A document selected for prediction
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Arc<Vec<u8>>,
    pub origin: SourceOrigin,
}

impl SourceDocument {
    /// Create a local document, rejecting unsupported MIME types
    pub fn local(name: impl Into<String>, mime: &str, bytes: Vec<u8>) -> DocumentResult<Self> {
        let kind = DocumentKind::from_mime(mime)
            .ok_or_else(|| DocumentError::UnsupportedFileType(mime.to_string()))?;
        Ok(Self {
            name: name.into(),
            kind,
            bytes: Arc::new(bytes),
            origin: SourceOrigin::LocalFile,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn source_url(&self) -> Option<&str> {
        match &self.origin {
            SourceOrigin::Url(url) => Some(url),
            SourceOrigin::LocalFile => None,
        }
    }
}

/// One page rasterized for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    /// 1-based page number
    pub page: u32,
    pub width: u32,
    pub height: u32,
    /// `data:image/jpeg;base64,...`
    pub image_uri: String,
}

impl RenderedPage {
    pub fn extent(&self) -> PageExtent {
        PageExtent {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(DocumentKind::from_mime("image/jpeg"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_mime("IMAGE/PNG"), Some(DocumentKind::Png));
        assert_eq!(
            DocumentKind::from_mime("application/pdf; qs=0.9"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_mime("image/tiff"), Some(DocumentKind::Tiff));
        assert_eq!(DocumentKind::from_mime("image/gif"), None);
        assert_eq!(DocumentKind::from_mime(""), None);
    }

    #[test]
    fn test_local_rejects_unsupported() {
        let err = SourceDocument::local("a.gif", "image/gif", vec![]).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFileType(m) if m == "image/gif"));
    }

    #[test]
    fn test_local_document() {
        let doc = SourceDocument::local("scan.pdf", "application/pdf", vec![1, 2, 3]).unwrap();
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert!(doc.kind.is_paged());
        assert_eq!(doc.source_url(), None);
    }
}
