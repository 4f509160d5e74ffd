use super::rules::{fold_case, is_acronym, is_stopword};

/// Title-case a whitespace separated phrase.
///
/// Acronyms are capitalized fully, stopwords stay lowercase unless they open
/// the phrase, and everything else goes through [`title_case_word`].
pub(crate) fn title_case_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            let folded = fold_case(word);
            if is_acronym(&folded) {
                word.to_uppercase()
            } else if i == 0 || !is_stopword(&folded) {
                title_case_word(word)
            } else {
                lower
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case a single word.
///
/// Mixed-case words ("iPhone", "McDonald") are kept verbatim. Hyphenated
/// words get every segment capitalized.
pub(crate) fn title_case_word(word: &str) -> String {
    let has_upper = word.chars().any(char::is_uppercase);
    let has_lower = word.chars().any(char::is_lowercase);
    if has_upper && has_lower {
        return word.to_string();
    }

    word.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(segment: &str) -> String {
    let lower = segment.to_lowercase();
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return lower;
    };

    let mut upper = first.to_uppercase();
    // Characters without a single-char uppercase form ("ß") stay as they are
    let head = match (upper.next(), upper.next()) {
        (Some(c), None) => c,
        _ => first,
    };

    let mut out = String::with_capacity(lower.len());
    out.push(head);
    out.push_str(chars.as_str());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_phrase_stopwords() {
        assert_eq!(title_case_phrase("the lord of the rings"), "The Lord of the Rings");
    }

    #[test]
    fn test_title_case_phrase_acronyms() {
        assert_eq!(title_case_phrase("fbi raid in nyc"), "FBI Raid in NYC");
    }

    #[test]
    fn test_title_case_phrase_folds_before_lookups() {
        assert_eq!(title_case_phrase("the ıt crowd"), "The IT Crowd");
        assert_eq!(title_case_phrase("ſec filing"), "SEC Filing");
    }

    #[test]
    fn test_title_case_word_preserves_mixed_case() {
        assert_eq!(title_case_word("iPhone"), "iPhone");
        assert_eq!(title_case_word("McDonald"), "McDonald");
    }

    #[test]
    fn test_title_case_word_hyphen_segments() {
        assert_eq!(title_case_word("post-apocalyptic"), "Post-Apocalyptic");
        assert_eq!(title_case_word("X-RAY"), "X-Ray");
    }

    #[test]
    fn test_title_case_word_all_caps() {
        assert_eq!(title_case_word("HELLO"), "Hello");
    }

    #[test]
    fn test_capitalize_non_ascii() {
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize("ßtraße"), "ßtraße");
        assert_eq!(capitalize(""), "");
    }
}
