//! Field name matching
//!
//! Tag names, highlighted fields and result rows all compare field names the
//! same way: Unicode lower-case folding.

/// Folded form of a field or tag name
pub fn field_key(name: &str) -> String {
    name.to_lowercase()
}

/// Whether `name` refers to `other`; an empty `other` matches nothing
pub fn is_same_field(name: &str, other: &str) -> bool {
    !other.is_empty() && field_key(name) == field_key(other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_non_ascii() {
        assert!(is_same_field("État", "ÉTAT"));
        assert!(is_same_field("Straße", "STRAßE"));
        assert!(!is_same_field("Total", "Totals"));
    }

    #[test]
    fn test_empty_matches_nothing() {
        assert!(!is_same_field("", ""));
        assert!(!is_same_field("Total", ""));
    }
}
