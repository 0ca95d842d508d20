//! Bounding-box projection
//!
//! The service reports boxes in page units with the origin at the bottom-left
//! corner; rendered pages have their origin at the top-left with y growing
//! downward. Each corner is rescaled and flipped exactly once, when the feature
//! is created.

use serde::Serialize;

use super::field_name::is_same_field;
use super::palette::TagPalette;
use crate::analyze::AnalyzeResult;

/// Pixel size of the rendered page the overlay is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageExtent {
    pub width: u32,
    pub height: u32,
}

/// One predicted field drawn on the rendered page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFeature {
    pub field_name: String,
    /// Corner points in rendered-page pixels; the ring closes implicitly
    pub polygon: Vec<[i64; 2]>,
    pub color: String,
    pub is_highlighted: bool,
}

impl OverlayFeature {
    /// Outline width in pixels
    pub fn stroke_width(&self) -> u32 {
        if self.is_highlighted {
            4
        } else {
            2
        }
    }
}

/// Build overlay features for every field predicted on `page`.
///
/// Fields with a missing or malformed bounding box are skipped; an absent OCR
/// frame for the page yields no features.
pub fn project(
    result: &AnalyzeResult,
    page: u32,
    extent: PageExtent,
    palette: &TagPalette,
    highlighted: &str,
) -> Vec<OverlayFeature> {
    let Some(frame) = result.page_frame(page) else {
        tracing::warn!(page, "No OCR result for page, nothing to project");
        return Vec::new();
    };

    if frame.width <= 0.0 || frame.height <= 0.0 {
        tracing::warn!(page, width = frame.width, height = frame.height, "Degenerate OCR frame");
        return Vec::new();
    }

    let mut features = Vec::new();
    for (name, field) in result.fields() {
        if field.page != Some(page) {
            continue;
        }

        let bounding_box = match field.bounding_box.as_deref() {
            Some(b) if b.len() >= 8 && b.len() % 2 == 0 => b,
            other => {
                tracing::debug!(
                    field = name,
                    len = ?other.map(<[f64]>::len),
                    "Skipping field without usable bounding box"
                );
                continue;
            }
        };

        let polygon = bounding_box
            .chunks_exact(2)
            .map(|pair| {
                [
                    ((pair[0] / frame.width) * extent.width as f64).round() as i64,
                    ((1.0 - pair[1] / frame.height) * extent.height as f64).round() as i64,
                ]
            })
            .collect();

        features.push(OverlayFeature {
            field_name: name.to_string(),
            polygon,
            color: palette.color_for(name).to_string(),
            is_highlighted: is_same_field(name, highlighted),
        });
    }

    features
}

/// Re-derive highlight flags without touching geometry
pub fn set_highlight(features: &mut [OverlayFeature], highlighted: &str) {
    for feature in features {
        feature.is_highlighted = is_same_field(&feature.field_name, highlighted);
    }
}
