//! Keyword canonicalization.
//!
//! Raw provider keywords ("sci-fi", "dea agent", "5th century bc") are turned
//! into display forms ("Sci-Fi", "DEA Agent", "5th Century BC") by a fixed
//! sequence of rule tiers; the first tier that applies wins:
//!
//! 1. literal corrections table
//! 2. structural patterns (decades, place pairs, "X vs Y", centuries, ...)
//! 3. whole-input acronyms
//! 4. generic title case with stopwords
//!
//! Normalization is idempotent: `normalize(&normalize(s)) == normalize(s)`.

mod patterns;
mod reconcile;
mod rules;
mod title_case;

pub use reconcile::reconcile;

use std::collections::HashSet;

/// Upper bound on tier rounds per keyword.
const MAX_ROUNDS: usize = 4;

/// Canonicalize a single keyword.
///
/// Surrounding whitespace is trimmed and internal runs of whitespace are
/// collapsed. Blank input yields an empty string.
pub fn normalize(raw: &str) -> String {
    // Capitalizing can turn a keyword into one an earlier tier claims
    // ("ıt" -> "It" -> "IT"), so the tiers run until the output settles.
    let mut current = normalize_once(raw);
    for _ in 1..MAX_ROUNDS {
        let next = normalize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_once(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return collapsed;
    }

    let lower = collapsed.to_lowercase();
    let folded = rules::fold_case(&collapsed);

    if let Some(replacement) = rules::literal_replacement(&folded) {
        return replacement.to_string();
    }

    if let Some(structured) = patterns::apply_structural(&lower) {
        return structured;
    }

    if rules::is_acronym(&folded) {
        return collapsed.to_uppercase();
    }

    title_case::title_case_phrase(&collapsed)
}

/// Canonicalize a keyword list, dropping blanks and case-insensitive
/// duplicates. The first occurrence wins and order is preserved.
pub fn normalize_all<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|keyword| normalize(keyword.as_ref()))
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .collect()
}

/// Whether every keyword already appears among the tags, ignoring case.
pub fn contains_all<S: AsRef<str>, T: AsRef<str>>(tags: &[S], keywords: &[T]) -> bool {
    let present: HashSet<String> = tags.iter().map(|t| t.as_ref().to_lowercase()).collect();
    keywords
        .iter()
        .all(|k| present.contains(&k.as_ref().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("sci-fi"), "Sci-Fi");
        assert_eq!(normalize("dea agent"), "DEA Agent");
        assert_eq!(normalize("5th century bc"), "5th Century BC");
        assert_eq!(normalize("father daughter"), "Father Daughter Relationship");
    }

    #[test]
    fn test_normalize_literal_is_case_insensitive() {
        assert_eq!(normalize("  SCI FI "), "Sci-Fi");
        assert_eq!(normalize("duringcreditsstinger"), "During Credits Stinger");
    }

    #[test]
    fn test_normalize_acronym() {
        assert_eq!(normalize("usa"), "USA");
        assert_eq!(normalize("4k"), "4K");
        assert_eq!(normalize("u.s."), "U.S.");
    }

    #[test]
    fn test_normalize_title_case() {
        assert_eq!(normalize("time travel"), "Time Travel");
        assert_eq!(normalize("the end of the world"), "The End of the World");
        assert_eq!(normalize("post-apocalyptic future"), "Post-Apocalyptic Future");
        assert_eq!(normalize("iPhone addiction"), "iPhone Addiction");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("time    travel"), "Time Travel");
    }

    #[test]
    fn test_normalize_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "sci-fi",
            "romcom",
            "1990s",
            "new york city, usa",
            "good vs. evil",
            "based on novel or book",
            "father daughter",
            "mother son relationship",
            "african american lead",
            "african american",
            "artificial intelligence (a.i.)",
            "dea agent",
            "mossad agent",
            "5th century bc",
            "21st century",
            "fbi",
            "the lord of the rings",
            "HELLO world",
            "x-ray vision",
            "McDonald's",
            "straße   ßtraße",
            "it",
            "woman director",
            "   ",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_folds_compatibility_letters() {
        assert_eq!(normalize("ıt"), "IT");
        assert_eq!(normalize("ſcifi"), "Sci-Fi");
        assert_eq!(normalize("ǆungla"), "Ǆungla");
        assert_eq!(normalize("straße"), "Straße");
    }

    fn capitalize_first(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    #[test]
    fn test_normalize_is_idempotent_over_generated_inputs() {
        let words = [
            "sci", "fi", "scifi", "ıt", "ſcifi", "ǆungla", "straße", "ß", "usa", "fbi", "agent",
            "the", "in", "ın", "aſ", "time", "travel", "x-ray", "post-apocalyptic", "iPhone",
            "ſec", "1990s", "father", "daughter",
        ];
        let templates = [
            "{a}",
            "{a} {b}",
            "{a}-{b}",
            "{a}, {b}",
            "{a} vs. {b}",
            "{a}   vs {b}",
            "based on {a} {b}",
            "{a} agent",
            "{a} ({b})",
            "5th century {a}",
            "{a} {b} relationship",
        ];
        let cases: [fn(&str) -> String; 3] =
            [|s| s.to_string(), |s| s.to_uppercase(), capitalize_first];

        let mut checked = 0;
        for a in words {
            for b in words {
                for template in templates {
                    let phrase = template.replace("{a}", a).replace("{b}", b);
                    for case in cases {
                        let input = case(&phrase);
                        let once = normalize(&input);
                        assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
                        checked += 1;
                    }
                }
            }
        }
        assert_eq!(checked, words.len() * words.len() * templates.len() * cases.len());
    }

    #[test]
    fn test_normalize_all_dedupes_after_normalizing() {
        let result = normalize_all(&["sci-fi", "Sci-Fi", "scifi", "time travel", "TIME TRAVEL"]);
        assert_eq!(result, vec!["Sci-Fi", "Time Travel"]);
    }

    #[test]
    fn test_normalize_all_preserves_order_and_drops_blanks() {
        let result = normalize_all(&["zombie", "", "alien", "  ", "heist"]);
        assert_eq!(result, vec!["Zombie", "Alien", "Heist"]);
    }

    #[test]
    fn test_normalize_all_output_has_no_case_insensitive_duplicates() {
        let result = normalize_all(&["usa", "USA", "U.S.A", "fbi agent", "FBI Agent"]);
        let mut lowered: Vec<String> = result.iter().map(|k| k.to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), result.len());
    }

    #[test]
    fn test_contains_all() {
        let tags = vec!["Sci-Fi".to_string(), "Action".to_string()];
        assert!(contains_all(&tags, &["sci-fi", "ACTION"]));
        assert!(!contains_all(&tags, &["Sci-Fi", "Drama"]));
        assert!(contains_all(&tags, &[] as &[&str]));
    }
}
