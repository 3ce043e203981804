use once_cell::sync::Lazy;
use regex::Regex;

// "1. ", "2) " and a bare "3." line; "2.0 TDI" is not numbering
static NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)](?:\s+|$)").unwrap());

/// Split a raw completion into candidate question lines.
///
/// Blank lines are dropped and a leading `1.` / `2)` numbering is removed.
/// No de-duplication happens here.
pub fn parse_question_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .map(|line| NUMBERING.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
