//! Cell-level normalisation for loosely formatted stock exports.
//!
//! None of these functions fail: unusable input degrades to an empty token,
//! the placeholder name or zero.

use crate::domain::model::CellValue;
use regex::Regex;
use std::sync::LazyLock;

/// Name given to items whose name cell is empty.
pub const NO_NAME: &str = "no name";

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

static LEADING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[\s\-.]+").unwrap());

// Longest prefix a lenient float reader accepts.
static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").unwrap()
});

/// First run of ASCII digits in the cell's text, or `""` when there is none.
pub fn extract_identifier_token(raw: &CellValue) -> String {
    let text = raw.to_text();
    DIGIT_RUN
        .find(text.trim())
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Drops a leading `123 - ` style code from a product label.
pub fn clean_display_name(raw: &CellValue) -> String {
    if raw.is_empty() {
        return NO_NAME.to_string();
    }
    let text = raw.to_text();
    LEADING_CODE.replace(text.trim(), "").trim().to_string()
}

/// Reads `1.234,56` style numbers: `.` groups thousands, `,` marks decimals.
///
/// Numeric cells pass through untouched. Empty cells and text without a
/// leading number read as `0.0`.
pub fn parse_locale_number(raw: &CellValue) -> f64 {
    match raw {
        CellValue::Number(n) => *n,
        CellValue::Empty => 0.0,
        CellValue::Text(s) if s.is_empty() => 0.0,
        CellValue::Text(s) => {
            let clean = s.replace('.', "").replacen(',', ".", 1);
            parse_float_prefix(&clean).unwrap_or(0.0)
        }
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let prefix = FLOAT_PREFIX.find(text)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
}
