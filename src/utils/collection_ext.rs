//! Collection helpers
//!
//! Small iterator/Vec utilities shared by the services.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Convert a Vec into a HashMap keyed by `key_fn`
///
/// # Example
/// ```ignore
/// let contexts: Vec<GenerationContext> = ...;
/// let by_id = vec_to_map(contexts, |c| c.generation_id.clone());
/// ```
#[inline]
pub fn vec_to_map<T, K, F>(items: Vec<T>, key_fn: F) -> HashMap<K, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    items.into_iter().map(|item| (key_fn(&item), item)).collect()
}

/// Remove duplicates, keeping the first occurrence and the original order
///
/// # Example
/// ```ignore
/// let ids = vec![1, 2, 1, 3, 2];
/// let unique = unique_ordered(ids); // [1, 2, 3]
/// ```
#[inline]
pub fn unique_ordered<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Like [`unique_ordered`], but two items are equal when their keys are
///
/// # Example
/// ```ignore
/// let questions = vec!["A?".to_string(), "a?".to_string()];
/// let unique = unique_ordered_by(questions, |q| q.to_lowercase()); // ["A?"]
/// ```
pub fn unique_ordered_by<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key_fn(item))).collect()
}

/// Items of `items` that appear more than once, each reported once, in first-seen order
pub fn find_duplicates<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    items
        .iter()
        .filter(|item| !seen.insert(*item) && reported.insert(*item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ordered_keeps_first() {
        assert_eq!(unique_ordered(vec![1, 2, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn test_unique_ordered_by_key() {
        let items = vec!["Öl?".to_string(), " öl? ".to_string(), "Bremse?".to_string()];
        let unique = unique_ordered_by(items, |s| s.trim().to_lowercase());
        assert_eq!(unique, vec!["Öl?".to_string(), "Bremse?".to_string()]);
    }

    #[test]
    fn test_find_duplicates() {
        let ids = ["g1", "g2", "g1", "g1", "g3", "g2"];
        assert_eq!(find_duplicates(&ids), vec!["g1", "g2"]);
        assert!(find_duplicates(&["a", "b"]).is_empty());
    }

    #[test]
    fn test_vec_to_map() {
        let map = vec_to_map(vec![("a", 1), ("b", 2)], |(k, _)| *k);
        assert_eq!(map["b"], ("b", 2));
    }
}
