use std::collections::{HashMap, HashSet};

use super::normalize;

/// Merge the current tags of an item with freshly normalized keywords.
///
/// A current tag is dropped only when its normalized form is among `fresh`
/// and its raw text differs from that canonical form ("sci-fi" next to a
/// fresh "Sci-Fi"). Surviving current tags come first, then the fresh
/// keywords not already present. Both halves are deduplicated
/// case-insensitively with the first occurrence winning.
pub fn reconcile<S: AsRef<str>, T: AsRef<str>>(current: &[S], fresh: &[T]) -> Vec<String> {
    let canonical: HashMap<String, &str> = fresh
        .iter()
        .map(|k| (k.as_ref().to_lowercase(), k.as_ref()))
        .collect();

    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(current.len() + fresh.len());

    for tag in current.iter().map(|t| t.as_ref()) {
        let stale = canonical
            .get(&normalize(tag).to_lowercase())
            .is_some_and(|proper| *proper != tag);
        if stale {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            merged.push(tag.to_string());
        }
    }

    for keyword in fresh.iter().map(|k| k.as_ref()) {
        if seen.insert(keyword.to_lowercase()) {
            merged.push(keyword.to_string());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_replaces_stale_variant() {
        let merged = reconcile(
            &["Action", "sci-fi", "Drama", "Custom Tag"],
            &["Sci-Fi", "Time Travel"],
        );
        assert_eq!(
            merged,
            vec!["Action", "Drama", "Custom Tag", "Sci-Fi", "Time Travel"]
        );
    }

    #[test]
    fn test_reconcile_keeps_exact_manual_tag() {
        let merged = reconcile(&["Sci-Fi", "Heist"], &["Sci-Fi"]);
        assert_eq!(merged, vec!["Sci-Fi", "Heist"]);
    }

    #[test]
    fn test_reconcile_keeps_tags_without_fresh_counterpart() {
        let merged = reconcile(&["scifi", "my list"], &["Time Travel"]);
        assert_eq!(merged, vec!["scifi", "my list", "Time Travel"]);
    }

    #[test]
    fn test_reconcile_collapses_both_variants_to_canonical() {
        let merged = reconcile(&["sci-fi", "Sci-Fi", "SCIFI"], &["Sci-Fi"]);
        assert_eq!(merged, vec!["Sci-Fi"]);
    }

    #[test]
    fn test_reconcile_with_no_current_tags() {
        let merged = reconcile(&[] as &[&str], &["Zombie", "Survival"]);
        assert_eq!(merged, vec!["Zombie", "Survival"]);
    }

    #[test]
    fn test_reconcile_never_drops_unrelated_tags() {
        let current = ["Favorites", "4K", "kids", "dea agent", "Watched"];
        let fresh = ["DEA Agent", "Undercover"];
        let merged = reconcile(&current, &fresh);

        let lowered: Vec<String> = merged.iter().map(|t| t.to_lowercase()).collect();
        for tag in current {
            let replaced = fresh
                .iter()
                .any(|f| f.to_lowercase() == normalize(tag).to_lowercase());
            if !replaced {
                assert!(lowered.contains(&tag.to_lowercase()), "{} was dropped", tag);
            }
        }
        assert!(!merged.contains(&"dea agent".to_string()));
        assert!(merged.contains(&"DEA Agent".to_string()));
    }
}
