//! Structural keyword patterns, tried in order against the lowercase input.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::rules::is_acronym;
use super::title_case::{title_case_phrase, title_case_word};

static DECADE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}s$").unwrap());

static PLACE_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^,]+),\s*([^,]+)$").unwrap());

static VERSUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s+vs\.?\s+(.+)$").unwrap());

static BASED_ON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^based on\s+(.+)$").unwrap());

static KINSHIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(father|mother|parent|brother|sister|son|daughter)\s+(father|mother|parent|brother|sister|son|daughter)(?:\s+relationship)?$",
    )
    .unwrap()
});

static ORIGIN_ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(african|asian|european|american|british|french|german|italian|spanish|chinese|japanese|korean|indian|mexican|latin|hispanic)\s+(american|lead|character|protagonist|antagonist|actor|actress)$",
    )
    .unwrap()
});

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+\(([a-z.]+)\)$").unwrap());

static ABBREVIATION_ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([a-z]{2,5})\s+(special agent|agent|director|officer|investigator|detective|operative|analyst|chief|deputy)$",
    )
    .unwrap()
});

static CENTURY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(st|nd|rd|th)\s+century(?:\s+([a-z.]+))?$").unwrap());

type Handler = fn(&Captures<'_>) -> String;

/// Pattern table in priority order.
static PATTERNS: Lazy<Vec<(&'static Lazy<Regex>, Handler)>> = Lazy::new(|| {
    vec![
        (&DECADE, decade as Handler),
        (&PLACE_PAIR, place_pair),
        (&VERSUS, versus),
        (&BASED_ON, based_on),
        (&KINSHIP, kinship),
        (&ORIGIN_ROLE, origin_role),
        (&PARENTHESIZED, parenthesized),
        (&ABBREVIATION_ROLE, abbreviation_role),
        (&CENTURY, century),
    ]
});

/// Apply the first matching structural pattern to a lowercase,
/// whitespace-collapsed keyword.
pub(crate) fn apply_structural(lower: &str) -> Option<String> {
    PATTERNS
        .iter()
        .find_map(|(regex, handler)| regex.captures(lower).map(|caps| handler(&caps)))
}

fn group<'a>(caps: &'a Captures<'_>, i: usize) -> &'a str {
    caps.get(i).map(|m| m.as_str()).unwrap_or_default()
}

fn decade(caps: &Captures<'_>) -> String {
    group(caps, 0).to_string()
}

fn place_pair(caps: &Captures<'_>) -> String {
    format!(
        "{}, {}",
        title_case_phrase(group(caps, 1)),
        title_case_phrase(group(caps, 2))
    )
}

fn versus(caps: &Captures<'_>) -> String {
    format!(
        "{} vs {}",
        title_case_phrase(group(caps, 1)),
        title_case_phrase(group(caps, 2))
    )
}

fn based_on(caps: &Captures<'_>) -> String {
    format!("Based on {}", title_case_phrase(group(caps, 1)))
}

fn kinship(caps: &Captures<'_>) -> String {
    format!(
        "{} {} Relationship",
        title_case_word(group(caps, 1)),
        title_case_word(group(caps, 2))
    )
}

fn origin_role(caps: &Captures<'_>) -> String {
    format!(
        "{} {}",
        title_case_word(group(caps, 1)),
        title_case_word(group(caps, 2))
    )
}

fn parenthesized(caps: &Captures<'_>) -> String {
    format!(
        "{} ({})",
        title_case_phrase(group(caps, 1)),
        group(caps, 2).to_uppercase()
    )
}

fn abbreviation_role(caps: &Captures<'_>) -> String {
    let abbreviation = group(caps, 1);
    let abbreviation = if is_acronym(abbreviation) || abbreviation.len() <= 4 {
        abbreviation.to_uppercase()
    } else {
        title_case_word(abbreviation)
    };
    format!("{} {}", abbreviation, title_case_phrase(group(caps, 2)))
}

fn century(caps: &Captures<'_>) -> String {
    let base = format!("{}{} Century", group(caps, 1), group(caps, 2));
    match caps.get(3).map(|m| m.as_str()) {
        Some(suffix) if is_acronym(suffix) || suffix.len() <= 2 => {
            format!("{} {}", base, suffix.to_uppercase())
        }
        Some(suffix) => format!("{} {}", base, title_case_word(suffix)),
        None => base,
    }
}
