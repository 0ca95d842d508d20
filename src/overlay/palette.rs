//! Tag palette lookup

use std::collections::HashMap;

use super::field_name::field_key;
use crate::project::Tag;

/// Color of fields that match no project tag
pub const DEFAULT_COLOR: &str = "#333333";

/// Tag colors keyed by lower-cased tag name
#[derive(Debug, Clone, Default)]
pub struct TagPalette {
    colors: HashMap<String, String>,
}

impl TagPalette {
    pub fn new(tags: &[Tag]) -> Self {
        let mut colors = HashMap::with_capacity(tags.len());
        for tag in tags {
            // First tag wins, as a linear scan would
            colors
                .entry(field_key(&tag.name))
                .or_insert_with(|| tag.color.clone());
        }
        Self { colors }
    }

    /// Color for a field name, case-insensitively
    pub fn color_for(&self, field_name: &str) -> &str {
        self.colors
            .get(&field_key(field_name))
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
