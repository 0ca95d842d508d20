//! Prediction overlay
//!
//! Projects field bounding boxes reported by the analysis service onto the
//! rendered page image and tracks which field is highlighted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formscope_server::overlay::{project, set_highlight, TagPalette};
//!
//! let palette = TagPalette::new(&project.tags);
//! let mut features = project(&result, 1, page.extent(), &palette, "");
//!
//! // Hover changes only touch the highlight flags
//! set_highlight(&mut features, "Total");
//! ```

mod field_name;
mod palette;
mod projector;

pub use field_name::{field_key, is_same_field};
pub use palette::{TagPalette, DEFAULT_COLOR};
pub use projector::{project, set_highlight, OverlayFeature, PageExtent};
