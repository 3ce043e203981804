//! String helpers

/// Trimmed value, `None` when missing or blank
#[inline]
pub fn clean_optional_string(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Comparison key for free text: trimmed and lower-cased.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
#[inline]
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

pub trait StringExt {
    /// Empty or whitespace only
    fn is_blank(&self) -> bool;
}

impl StringExt for str {
    #[inline]
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl StringExt for String {
    #[inline]
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["  Warum leuchtet die ABS-Lampe?  ", "ÖLSTAND PRÜFEN", "", "\tx\n"] {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once);
        }
        assert_eq!(normalize_text("  Warum Leuchtet  "), "warum leuchtet");
    }

    #[test]
    fn test_blank_and_clean_optional() {
        assert!(String::from(" \t").is_blank());
        assert!(!"  a ".is_blank());
        assert_eq!(clean_optional_string(Some(&" 5G ".to_string())), Some("5G".to_string()));
        assert_eq!(clean_optional_string(Some(&"  ".to_string())), None);
    }
}
