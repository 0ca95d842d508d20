//! Fetching source documents by URL

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::error::{DocumentError, DocumentResult};
use super::types::{DocumentKind, SourceDocument, SourceOrigin};

/// Content types accepted from remote documents
pub const ACCEPTED_CONTENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/png", "image/tiff"];

/// Download a document, checking its Content-Type before reading the body
pub async fn fetch_document(client: &reqwest::Client, url: &str) -> DocumentResult<SourceDocument> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| DocumentError::FetchFailed(format!("Invalid URL {}: {}", url, e)))?;

    let response = client
        .get(parsed.clone())
        .header(ACCEPT, ACCEPTED_CONTENT_TYPES.join(", "))
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(url, error = %e, "Fetching document failed");
            DocumentError::Network(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DocumentError::FetchFailed(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let kind = DocumentKind::from_mime(&content_type)
        .ok_or_else(|| DocumentError::UnsupportedContentType(content_type.clone()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocumentError::FetchFailed(format!("Invalid data: {}", e)))?;

    let name = file_name_from_url(&parsed);
    tracing::info!(url, name = %name, size = bytes.len(), ?kind, "Fetched document");

    Ok(SourceDocument {
        name,
        kind,
        bytes: Arc::new(bytes.to_vec()),
        origin: SourceOrigin::Url(url.to_string()),
    })
}

fn file_name_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| {
            urlencoding::decode(name)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| name.to_string())
        })
        .unwrap_or_else(|| url.host_str().unwrap_or("document").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        let url = reqwest::Url::parse("https://example.com/forms/Invoice%201.pdf?sig=abc").unwrap();
        assert_eq!(file_name_from_url(&url), "Invoice 1.pdf");

        let root = reqwest::Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name_from_url(&root), "example.com");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = fetch_document(&reqwest::Client::new(), "not a url")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::FetchFailed(_)));
    }
}
