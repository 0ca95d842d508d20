//! Page rendering
//!
//! Rasterizes one page of a source document and re-encodes it as a JPEG data
//! URI. Decoding is synchronous, so all work happens on the blocking pool.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use mupdf::{Colorspace, Matrix};

use super::error::{DocumentError, DocumentResult};
use super::types::{DocumentKind, RenderedPage, SourceDocument};

/// PDF pages are rendered at twice their nominal size
pub const DEFAULT_PDF_SCALE: f32 = 2.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

#[derive(Debug, Clone, Copy)]
pub struct PageRenderer {
    pdf_scale: f32,
    jpeg_quality: u8,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self {
            pdf_scale: DEFAULT_PDF_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl PageRenderer {
    /// Number of pages in the document
    pub async fn page_count(&self, doc: &SourceDocument) -> DocumentResult<u32> {
        if !doc.kind.is_paged() {
            return Ok(1);
        }

        let bytes = doc.bytes.clone();
        let mime = doc.mime_type();
        run_blocking(move || {
            let mupdf_doc = mupdf::Document::from_bytes(&bytes, mime)?;
            let count = mupdf_doc.page_count()?;
            Ok(count.max(0) as u32)
        })
        .await
    }

    /// Render a 1-based page
    pub async fn render(&self, doc: &SourceDocument, page: u32) -> DocumentResult<RenderedPage> {
        if page == 0 {
            return Err(DocumentError::PageOutOfRange { page, count: 0 });
        }

        let bytes = doc.bytes.clone();
        let kind = doc.kind;
        let renderer = *self;

        let rgb = run_blocking(move || match kind {
            DocumentKind::Jpeg | DocumentKind::Png => {
                if page != 1 {
                    return Err(DocumentError::PageOutOfRange { page, count: 1 });
                }
                Ok(image::load_from_memory(&bytes)?.to_rgb8())
            }
            DocumentKind::Pdf => render_paged(&bytes, kind, page, renderer.pdf_scale),
            // TIFF frames keep their native size
            DocumentKind::Tiff => render_paged(&bytes, kind, page, 1.0),
        })
        .await?;

        let (width, height) = rgb.dimensions();
        let image_uri = self.encode_data_uri(rgb)?;

        tracing::debug!(page, width, height, kind = ?doc.kind, "Rendered page");

        Ok(RenderedPage {
            page,
            width,
            height,
            image_uri,
        })
    }

    fn encode_data_uri(&self, rgb: RgbImage) -> DocumentResult<String> {
        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.jpeg_quality).encode_image(&rgb)?;

        Ok(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&output)
        ))
    }
}

fn render_paged(bytes: &[u8], kind: DocumentKind, page: u32, scale: f32) -> DocumentResult<RgbImage> {
    let mupdf_doc = mupdf::Document::from_bytes(bytes, kind.mime_type())?;
    let count = mupdf_doc.page_count()?.max(0) as u32;
    if page > count {
        return Err(DocumentError::PageOutOfRange { page, count });
    }

    let mupdf_page = mupdf_doc.load_page(page as i32 - 1)?;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = mupdf_page.to_pixmap(&matrix, &colorspace, false, true)?;

    pixmap_to_rgb(&pixmap)
}

fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> DocumentResult<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    if n < 3 {
        return Err(DocumentError::Render(format!(
            "Unexpected pixmap component count: {}",
            n
        )));
    }

    let mut rgb_buffer = Vec::with_capacity(rgb_len(width, height));
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let pixel = samples.get(offset..offset + 3).unwrap_or(&[255, 255, 255]);
            rgb_buffer.extend_from_slice(pixel);
        }
    }

    RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| DocumentError::Render("Failed to create image buffer".to_string()))
}

/// Byte length of a packed RGB raster; large scans exceed `u32`
fn rgb_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

async fn run_blocking<T, F>(f: F) -> DocumentResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocumentError::Render(format!("Task join error: {}", e)))?
}
