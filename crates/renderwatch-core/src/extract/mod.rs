//! Text-to-progress extraction.
//!
//! Pure functions that turn whatever string the editor exposes into a
//! percentage or a remaining-time string. Absence is the only "no match"
//! signal; none of these functions fail.

use once_cell::sync::Lazy;
use regex::Regex;

/// First number directly followed by an optional space and `%`. Decimals
/// may use `.` or `,` and may omit the leading digit (".5%", "45,5 %").
static PERCENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d*[.,]?\d+)\s*%").expect("Invalid PERCENT_PATTERN regex"));

/// Clock-style remaining time: "1:30:00 remaining", "12:05 left"
static CLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}:\d{2}(?::\d{2})?)\s*(?:remaining|left)\b")
        .expect("Invalid CLOCK_PATTERN regex")
});

/// Composite remaining time: "2h 30m remaining", "45s left",
/// "1 hour 5 minutes remaining"
static COMPOSITE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    const UNIT: &str = r"\d+\s*(?:hours?|hrs?|minutes?|mins?|seconds?|secs?|[hms])";
    Regex::new(&format!(
        r"(?i)\b({UNIT}(?:\s*{UNIT}){{0,2}})\s*(?:remaining|left)\b"
    ))
    .expect("Invalid COMPOSITE_PATTERN regex")
});

/// Approximate remaining time: "About 5 minutes", "about 1 hr"
static ABOUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\babout\s+(\d+(?:\.\d+)?\s*(?:hours?|hrs?|minutes?|mins?|seconds?|secs?|h|m|s))\b",
    )
    .expect("Invalid ABOUT_PATTERN regex")
});

/// Extract the leftmost `<number>%` value from `text`.
///
/// The number is returned as written; range checking is left to
/// [`normalize_candidate`].
pub fn extract_percentage(text: &str) -> Option<f64> {
    PERCENT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
}

/// Parse a number that may use a decimal comma
fn parse_decimal(text: &str) -> Option<f64> {
    text.replacen(',', ".", 1).parse::<f64>().ok()
}

/// Extract a remaining-time string from `text`.
///
/// Patterns are tried in a fixed order (clock, composite, "about N unit")
/// and the first one that matches wins.
pub fn extract_duration(text: &str) -> Option<String> {
    [&*CLOCK_PATTERN, &*COMPOSITE_PATTERN, &*ABOUT_PATTERN]
        .into_iter()
        .find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
}

/// Turn a raw probe candidate into a percentage in `[0, 100]`.
///
/// A bare number in `(0, 1]` is read as fractional progress and scaled,
/// one in `(0, 100]` is read as a percentage. Anything else goes through
/// [`extract_percentage`], and values outside `[0, 100]` are dropped.
///
/// Note that a literal `1` reads as 100%, not 1%. Indicator widgets report
/// fractions, so the ambiguity is accepted.
pub fn normalize_candidate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();

    if let Some(value) = parse_decimal(trimmed) {
        if value > 0.0 && value <= 1.0 {
            return Some(value * 100.0);
        }
        if value > 0.0 && value <= 100.0 {
            return Some(value);
        }
    }

    extract_percentage(trimmed).filter(|p| (0.0..=100.0).contains(p))
}
