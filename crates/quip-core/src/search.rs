//! Snippet filtering
//!
//! Derives the visible snippet subset from the full collection, the active
//! category, and a query string. Pure functions, no state.

use uuid::Uuid;

use crate::models::Snippet;

/// Select the snippets to display
///
/// Keeps snippets in the active category, then applies a case-folded
/// substring match over label and content. No active category means an empty
/// result. A blank query keeps everything in the category. Result order
/// follows the input collection; there is no relevance ranking.
pub fn filter_snippets<'a>(
    snippets: &'a [Snippet],
    active_category: Option<Uuid>,
    query: &str,
) -> Vec<&'a Snippet> {
    let Some(category_id) = active_category else {
        return Vec::new();
    };

    let needle = query.trim().to_lowercase();

    snippets
        .iter()
        .filter(|s| s.category_id == category_id)
        .filter(|s| needle.is_empty() || matches_query(s, &needle))
        .collect()
}

/// Case-folded substring match over label or content
///
/// `needle` must already be trimmed and lowercased.
fn matches_query(snippet: &Snippet, needle: &str) -> bool {
    snippet.label.to_lowercase().contains(needle)
        || snippet.content.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Uuid, Vec<Snippet>) {
        let category_id = Uuid::new_v4();
        let snippets = vec![
            Snippet::new(None, category_id, "Intro", "Hello"),
            Snippet::new(None, category_id, "Closing", "Bye"),
        ];
        (category_id, snippets)
    }

    #[test]
    fn test_no_active_category_yields_nothing() {
        let (_, snippets) = sample();
        assert!(filter_snippets(&snippets, None, "").is_empty());
    }

    #[test]
    fn test_blank_query_keeps_category() {
        let (category_id, snippets) = sample();
        let visible = filter_snippets(&snippets, Some(category_id), "");
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let (category_id, snippets) = sample();

        for query in ["hello", "HELLO", "Hello"] {
            let visible = filter_snippets(&snippets, Some(category_id), query);
            assert_eq!(visible.len(), 1, "query {:?}", query);
            assert_eq!(visible[0].label, "Intro");
        }
    }

    #[test]
    fn test_query_matches_label_too() {
        let (category_id, snippets) = sample();
        let visible = filter_snippets(&snippets, Some(category_id), "closing");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content, "Bye");
    }

    #[test]
    fn test_query_matching_nothing() {
        let (category_id, snippets) = sample();
        assert!(filter_snippets(&snippets, Some(category_id), "zzz").is_empty());
    }

    #[test]
    fn test_query_is_trimmed() {
        let (category_id, snippets) = sample();
        let visible = filter_snippets(&snippets, Some(category_id), "  hello  ");
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn test_other_categories_are_excluded() {
        let (category_id, mut snippets) = sample();
        snippets.push(Snippet::new(None, Uuid::new_v4(), "Elsewhere", "Hello"));

        let visible = filter_snippets(&snippets, Some(category_id), "hello");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label, "Intro");
    }

    #[test]
    fn test_result_preserves_collection_order() {
        let (category_id, snippets) = sample();
        let visible = filter_snippets(&snippets, Some(category_id), "");
        assert_eq!(visible[0].label, "Intro");
        assert_eq!(visible[1].label, "Closing");
    }
}
