//! Title cleanup and normalization.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters some sites inject into titles that render as nothing.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{FEFF}'];

/// Separator characters trimmed from the ends of a cleaned title.
const SEPARATORS: &[char] = &[' ', '|', ':', '-', '\u{2013}', '\u{2014}'];

// "… and 3 more pages - Personal - Microsoft Edge"
static RE_MORE_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and \d+ more (?:pages?|tabs?)\b.*$").unwrap());

static RE_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+[-–—]\s+(?:[^-–—]+\s+[-–—]\s+)?microsoft\s*edge\s*$").unwrap()
});

static RE_BROWSER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+[-–—]\s+(?:google chrome|(?:mozilla )?firefox(?: private browsing)?|brave|chromium|opera|vivaldi)\s*$",
    )
    .unwrap()
});

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Remove zero-width and control characters.
pub fn strip_invisible(s: &str) -> String {
    s.chars()
        .filter(|c| !INVISIBLE.contains(c) && !c.is_control())
        .collect()
}

/// Remove the browser's window-title decoration ("- Google Chrome", tab counts, profile names).
pub fn strip_browser_chrome(s: &str) -> String {
    let s = RE_MORE_PAGES.replace(s, "");
    let s = RE_EDGE.replace(&s, "");
    let s = RE_BROWSER_SUFFIX.replace(&s, "");
    s.into_owned()
}

/// Final cosmetic pass over a title with markers and chrome already removed.
pub fn tidy(s: &str) -> String {
    let mut s = normalize_title(s);

    if let Some(rest) = s.strip_prefix("Watch ") {
        s = rest.to_string();
    }
    if let Some(rest) = s.strip_suffix(" on") {
        s = rest.to_string();
    }

    s.trim_matches(SEPARATORS).to_string()
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_title(s: &str) -> String {
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Cache key for a title: NFKC, case-folded, whitespace-collapsed, and
/// qualified by season when one is given.
pub fn normalize_key(title: &str, season: Option<u32>) -> String {
    let folded: String = title.nfkc().collect::<String>().to_lowercase();
    let key = normalize_title(&folded);
    match season {
        Some(n) => format!("{key}#s{n}"),
        None => key,
    }
}

/// Make a window title safe to write to a log line.
pub fn sanitize_for_log(s: &str) -> String {
    normalize_title(&strip_invisible(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_invisible() {
        assert_eq!(strip_invisible("Lo\u{200B}ki\u{200E}"), "Loki");
    }

    #[test]
    fn test_strip_chrome() {
        assert_eq!(
            strip_browser_chrome("Dark - Netflix - Google Chrome"),
            "Dark - Netflix"
        );
        assert_eq!(
            strip_browser_chrome("Dark | Netflix \u{2014} Mozilla Firefox"),
            "Dark | Netflix"
        );
        assert_eq!(
            strip_browser_chrome("Dark - Netflix and 3 more pages - Personal - Microsoft Edge"),
            "Dark - Netflix"
        );
        assert_eq!(
            strip_browser_chrome("Dark - Netflix - Work - Microsoft Edge"),
            "Dark - Netflix"
        );
        assert_eq!(strip_browser_chrome("Dark - Netflix - Brave"), "Dark - Netflix");
    }

    #[test]
    fn test_tidy() {
        assert_eq!(tidy("  Watch   The Mandalorian  | "), "The Mandalorian");
        assert_eq!(tidy("Loki on"), "Loki");
        assert_eq!(tidy("Watchmen"), "Watchmen");
        assert_eq!(tidy(" - "), "");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Stranger   Things ", None), "stranger things");
        assert_eq!(normalize_key("Stranger Things", Some(4)), "stranger things#s4");
        // Fullwidth forms fold to ASCII.
        assert_eq!(normalize_key("ＬＯＫＩ", None), "loki");
    }
}
