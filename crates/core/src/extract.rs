//! TMDb id extraction from file paths.
//!
//! Release folders carry the id in many shapes: `{tmdb-603}`, `[tmdb=603]`,
//! `(tmdb 603)`, `tmdb603`. The token must stand on its own: `mytmdb603` and
//! `tmdb603abc` are not ids.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static TMDB_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-zA-Z0-9])tmdb[^a-zA-Z0-9]*(\d+)(?:[^a-zA-Z0-9]|$)").unwrap()
});

/// Extract the first TMDb id embedded in a path.
pub fn extract_tmdb_id(path: &str) -> Option<String> {
    TMDB_TOKEN
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract from the first path that carries an id.
pub fn extract_from_paths<'a, I>(paths: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    paths.into_iter().find_map(extract_tmdb_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bracket_styles() {
        let cases = [
            "/movies/The Matrix (1999) [tmdb-603]/file.mkv",
            "/movies/The Matrix (1999) {tmdb-603}/file.mkv",
            "/movies/The Matrix (1999) (tmdb=603)/file.mkv",
            "/movies/The Matrix (1999) tmdb_603/file.mkv",
            "/movies/The Matrix (1999) tmdb:603.mkv",
            "/movies/The Matrix (1999) tmdb 603",
            "/movies/The Matrix (1999) [tmdb603]",
            "tmdb603",
        ];
        for path in cases {
            assert_eq!(extract_tmdb_id(path).as_deref(), Some("603"), "{}", path);
        }
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        assert_eq!(extract_tmdb_id("/m/Movie {TMDB-42}/m.mkv").as_deref(), Some("42"));
        assert_eq!(extract_tmdb_id("/m/Movie {TmDb-42}/m.mkv").as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_rejects_alphanumeric_boundaries() {
        assert_eq!(extract_tmdb_id("mytmdb12345"), None);
        assert_eq!(extract_tmdb_id("tmdb12345abc"), None);
        assert_eq!(extract_tmdb_id("/movies/xtmdb-12/file.mkv"), None);
        assert_eq!(extract_tmdb_id("/movies/tmdb-12x/file.mkv"), None);
    }

    #[test]
    fn test_extract_requires_digits() {
        assert_eq!(extract_tmdb_id("tmdb"), None);
        assert_eq!(extract_tmdb_id("/movies/[tmdb-]/file.mkv"), None);
    }

    #[test]
    fn test_extract_first_match_wins() {
        assert_eq!(
            extract_tmdb_id("/movies/[tmdb-111]/extras/[tmdb-222].mkv").as_deref(),
            Some("111")
        );
    }

    #[test]
    fn test_extract_long_digit_runs() {
        assert_eq!(
            extract_tmdb_id("[tmdb-123456789012345678901234567890]").as_deref(),
            Some("123456789012345678901234567890")
        );
    }

    #[test]
    fn test_extract_boundary_property() {
        let ids = ["1", "603", "98765"];
        let separators = ["", "-", "_", "=", ":", " ", "--"];
        let boundaries = ["", "/", "[", "{", "(", " ", "."];

        for id in ids {
            for sep in separators {
                let token = format!("tmdb{}{}", sep, id);
                for left in boundaries {
                    for right in boundaries {
                        let path = format!("{}{}{}", left, token, right);
                        assert_eq!(extract_tmdb_id(&path).as_deref(), Some(id), "{}", path);
                    }
                }
                assert_eq!(extract_tmdb_id(&format!("a{}", token)), None);
                assert_eq!(extract_tmdb_id(&format!("{}z", token)), None);
                assert_eq!(extract_tmdb_id(&format!("9{}", token)), None);
            }
        }
    }

    #[test]
    fn test_extract_from_paths() {
        let paths = ["/tv/Show/S01E01.mkv", "/tv/Show {tmdb-1399}/S01E02.mkv"];
        assert_eq!(extract_from_paths(paths).as_deref(), Some("1399"));
        assert_eq!(extract_from_paths(["/tv/none.mkv"]), None);
    }
}
