//! Text normalisation and field validation shared by every extractor.
//!
//! Upstream markup is positional and noisy: text nodes carry indentation,
//! newlines and placeholder tokens. Everything an extractor emits passes
//! through these helpers so that fields are either clean strings or empty.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+").unwrap());
static STRICT_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap());

/// Region used when no flag token can be read.
pub const UNKNOWN: &str = "Unknown";

/// Collapse internal whitespace runs to one space and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  Team\n   Liquid "), "Team Liquid");
/// assert_eq!(clean_text("\t\n"), "");
/// ```
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// All descendant text of an element, normalised with [`clean_text`].
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Validate a time field.
///
/// Returns the cleaned time when it is strict `H:MM` or `HH:MM`, and an
/// empty string for blanks, `TBD` placeholders, or anything else.
pub fn safe_time(raw: &str) -> String {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() || cleaned.contains("TBD") {
        return String::new();
    }
    if STRICT_TIME.is_match(&cleaned) {
        cleaned
    } else {
        String::new()
    }
}

/// Read a `mod-XX` region token off an element's class list, upper-cased.
///
/// Falls back to [`UNKNOWN`] when the element has no such class.
pub fn region_from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> String {
    classes
        .into_iter()
        .filter_map(|class| class.strip_prefix("mod-"))
        .find(|code| !code.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Derive a total page count from pagination control labels.
///
/// Each label contributes the number formed by its leading digits, so `3 »`
/// counts as 3; labels such as `next` or `»` are skipped. The result is the
/// largest number seen, with a floor of 1.
pub fn max_page_number<I, S>(labels: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .filter_map(|label| {
            let label = clean_text(label.as_ref());
            LEADING_DIGITS.find(&label)?.as_str().parse::<u32>().ok()
        })
        .fold(1, u32::max)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with a
/// byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Team\n\n   Liquid\t"), "Team Liquid");
        assert_eq!(clean_text("already clean"), "already clean");
        assert_eq!(clean_text(" \n\t "), "");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_safe_time_accepts_strict_times() {
        assert_eq!(safe_time("9:00"), "9:00");
        assert_eq!(safe_time(" 12:30 \n"), "12:30");
    }

    #[test]
    fn test_safe_time_rejects_garbage() {
        assert_eq!(safe_time(""), "");
        assert_eq!(safe_time("   "), "");
        assert_eq!(safe_time("TBD"), "");
        assert_eq!(safe_time("12:30 TBD"), "");
        assert_eq!(safe_time("12:30 PM"), "");
        assert_eq!(safe_time("123:00"), "");
        assert_eq!(safe_time("LIVE"), "");
    }

    #[test]
    fn test_region_from_classes() {
        assert_eq!(region_from_classes(["flag", "mod-us"]), "US");
        assert_eq!(region_from_classes(["mod-eu", "flag"]), "EU");
        assert_eq!(region_from_classes(["flag"]), "Unknown");
        assert_eq!(region_from_classes(["flag", "mod-"]), "Unknown");
    }

    #[test]
    fn test_max_page_number_skips_labels() {
        assert_eq!(max_page_number(["1", "2", "next", " 14 ", "»"]), 14);
        assert_eq!(max_page_number(["next"]), 1);
        assert_eq!(max_page_number(Vec::<String>::new()), 1);
        assert_eq!(max_page_number(["0"]), 1);
    }

    #[test]
    fn test_max_page_number_reads_leading_digits() {
        assert_eq!(max_page_number(["1", "2", "3 »"]), 3);
        assert_eq!(max_page_number(["12abc", "» 40"]), 12);
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 100), "short");
        let long = "a".repeat(500);
        let out = truncate_for_log(&long, 100);
        assert!(out.starts_with(&"a".repeat(100)));
        assert!(out.contains("…(+400 bytes)"));
    }
}
