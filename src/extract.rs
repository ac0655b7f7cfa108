//! Name and identity-number extraction from recognized text.
//!
//! Pure functions, no async, easily testable. Runs the compiled rule
//! matchers over the newline-joined OCR text and returns a complete field
//! pair. Absent fields come back as sentinel strings, never as empty or
//! missing values.

use serde::Serialize;

use crate::rules::CompiledRules;

pub const NAME_SENTINEL: &str = "Name Not Found";
pub const CNIC_SENTINEL: &str = "CNIC Not Found";

/// Extracted document fields. Both values are non-empty: a real value or the
/// "not found" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fields {
    pub name: String,
    pub cnic: String,
}

/// Format a raw identity-number candidate into its canonical dashed form.
///
/// Spaces and dashes are stripped first; 13, 12, and 11 digits map to
/// 5-7-1, 5-5-2, and 5-4-2 groups. Any other length, or non-digit residue,
/// degrades to the sentinel. Total function.
pub fn format_cnic(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return CNIC_SENTINEL.to_string();
    }

    match digits.len() {
        13 => format!("{}-{}-{}", &digits[..5], &digits[5..12], &digits[12..]),
        12 => format!("{}-{}-{}", &digits[..5], &digits[5..10], &digits[10..]),
        11 => format!("{}-{}-{}", &digits[..5], &digits[5..9], &digits[9..]),
        _ => CNIC_SENTINEL.to_string(),
    }
}

/// Extract the holder's name and identity number from an OCR text blob.
///
/// Noise tokens are stripped first; both searches then run over the cleaned
/// text and the leftmost match wins. Deterministic: identical text and rules
/// always produce identical fields.
pub fn extract_fields(text: &str, rules: &CompiledRules) -> Fields {
    let cleaned = match &rules.noise {
        Some(noise) => noise.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };

    let cnic = rules
        .id
        .find(&cleaned)
        .map(|m| format_cnic(m.as_str()))
        .unwrap_or_else(|| CNIC_SENTINEL.to_string());

    // An empty capture after trimming counts as not found, keeping the
    // non-empty field invariant.
    let name = rules
        .name
        .captures(&cleaned)
        .map(|caps| collapse_whitespace(caps.get(1).map_or("", |m| m.as_str())))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| NAME_SENTINEL.to_string());

    Fields { name, cnic }
}

/// Collapse internal whitespace runs to single spaces and trim.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
