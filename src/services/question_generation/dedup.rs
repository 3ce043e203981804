use std::collections::{HashSet, VecDeque};

use crate::utils::normalize_text;

/// Recent window used when none is configured.
pub const DEFAULT_RECENT_WINDOW: usize = 200;

/// Set of accepted questions for one job.
///
/// Equality is exact after [`QuestionSetDeduplicator::normalize`]; paraphrases
/// are not detected. The set only grows. Alongside it a bounded window of the
/// most recently accepted questions is kept for prompt context.
#[derive(Debug, Clone)]
pub struct QuestionSetDeduplicator {
    seen: HashSet<String>,
    recent: VecDeque<String>,
    recent_window: usize,
}

impl Default for QuestionSetDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_WINDOW)
    }
}

impl QuestionSetDeduplicator {
    pub fn new(recent_window: usize) -> Self {
        Self {
            seen: HashSet::new(),
            recent: VecDeque::with_capacity(recent_window),
            recent_window,
        }
    }

    /// Trim + lower-case
    pub fn normalize(text: &str) -> String {
        normalize_text(text)
    }

    pub fn is_duplicate(&self, text: &str) -> bool {
        self.seen.contains(&Self::normalize(text))
    }

    /// Register `text`. Returns `false` (and changes nothing) when an equal
    /// question is already present or `text` is blank.
    pub fn add(&mut self, text: &str) -> bool {
        let key = Self::normalize(text);
        if key.is_empty() || !self.seen.insert(key) {
            return false;
        }

        if self.recent_window > 0 {
            if self.recent.len() == self.recent_window {
                self.recent.pop_front();
            }
            self.recent.push_back(text.trim().to_string());
        }
        true
    }

    /// Up to `n` most recently accepted questions, oldest first
    pub fn recent(&self, n: usize) -> Vec<&str> {
        let skip = self.recent.len().saturating_sub(n);
        self.recent.iter().skip(skip).map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
