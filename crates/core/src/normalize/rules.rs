//! Fixed rule tables used by the keyword normalizer.
//!
//! These tables are versioned with the crate. Changing them changes the
//! canonical form of existing keywords, so run a force update afterwards.

/// Known abbreviation corrections, keyed by the trimmed lowercase input.
pub(crate) fn literal_replacement(lower: &str) -> Option<&'static str> {
    let replacement = match lower {
        "sci-fi" | "scifi" | "sci fi" => "Sci-Fi",
        "romcom" | "rom-com" | "rom com" => "Romantic Comedy",
        "bio-pic" | "bio pic" | "biopic" => "Biopic",
        "neo-noir" | "neo noir" | "neonoir" => "Neo-Noir",
        "duringcreditsstinger" => "During Credits Stinger",
        "aftercreditsstinger" => "After Credits Stinger",
        "midcreditsstinger" => "Mid Credits Stinger",
        _ => return None,
    };
    Some(replacement)
}

const ACRONYMS: &[&str] = &[
    // Countries and places
    "usa", "uk", "us", "u.s.", "dc", "nyc", "la", "sf",
    // Agencies and institutions
    "fbi", "cia", "nsa", "dea", "atf", "ice", "epa", "irs", "sec", "nasa", "nypd", "lapd",
    "swat", "bbc", "cbs", "nbc", "abc", "cnn", "mtv",
    // Technology and formats
    "ai", "a.i.", "cgi", "vr", "ar", "3d", "4k", "hd", "uhd", "tv", "vhs", "dvd", "cd", "pc",
    "mac", "ios", "os",
    // History
    "wwi", "wwii", "bc", "ad",
    // Misc
    "lgbt", "lgbtq", "ufo", "dj", "mc", "suv", "rv", "phd", "md", "ceo", "cto", "cfo", "hr",
    "it", "pr",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor", "of", "on",
    "or", "over", "the", "to", "up", "with", "within",
];

/// Full case fold used for table lookups, so letters such as dotless `ı` or
/// long `ſ` meet the tables in the form their capitals would produce.
pub(crate) fn fold_case(s: &str) -> String {
    s.to_uppercase().to_lowercase()
}

/// Whether a lowercase token is a known short-form term rendered in capitals.
pub(crate) fn is_acronym(lower: &str) -> bool {
    ACRONYMS.contains(&lower)
}

/// Whether a lowercase token stays lowercase inside a title.
pub(crate) fn is_stopword(lower: &str) -> bool {
    STOPWORDS.contains(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_table() {
        assert_eq!(literal_replacement("scifi"), Some("Sci-Fi"));
        assert_eq!(literal_replacement("romcom"), Some("Romantic Comedy"));
        assert_eq!(literal_replacement("drama"), None);
    }

    #[test]
    fn test_tables_are_lowercase() {
        for term in ACRONYMS.iter().chain(STOPWORDS) {
            assert_eq!(*term, term.to_lowercase());
        }
    }

    #[test]
    fn test_fold_case_maps_compatibility_letters() {
        assert_eq!(fold_case("ıt"), "it");
        assert_eq!(fold_case("ſcifi"), "scifi");
        assert_eq!(fold_case("ǅungla"), "ǆungla");
        assert_eq!(fold_case("straße"), "strasse");
    }

    #[test]
    fn test_acronym_and_stopword_sets_are_disjoint() {
        for term in ACRONYMS {
            assert!(!is_stopword(term), "{} is in both tables", term);
        }
    }
}
