//! Like-count parsing.
//!
//! Comment renderers show like counts as locale-formatted labels such as
//! `"1,234"` or `"1.2万"`. This module turns those labels into plain integers.

use regex::Regex;
use std::sync::OnceLock;

/// Multiplier for the ten-thousand unit markers (万 / 만)
const TEN_THOUSAND: f64 = 10_000.0;

static UNIT_REGEX: OnceLock<Regex> = OnceLock::new();

fn unit_regex() -> &'static Regex {
    UNIT_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*[万만]$").expect("Invalid unit regex")
    })
}

/// Parse a like-count label into an integer.
///
/// Thousands separators are stripped. A trailing ten-thousand marker scales
/// the preceding decimal by 10,000 and rounds to the nearest integer.
/// Anything unparseable (empty, non-numeric, negative) yields `0`.
pub fn parse_popularity(raw: &str) -> u64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return 0;
    }

    if let Some(caps) = unit_regex().captures(&cleaned) {
        return caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|n| (n * TEN_THOUSAND).round() as u64)
            .unwrap_or(0);
    }

    cleaned.parse::<u64>().unwrap_or(0)
}
