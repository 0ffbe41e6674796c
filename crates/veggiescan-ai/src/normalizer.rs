use chrono::{DateTime, Utc};
use serde_json::Value;
use veggiescan_common::types::ScanResult;

use crate::mock::mock_result;

/// Confidence attached to a result parsed from a live model answer.
pub const FRESH_CONFIDENCE: u8 = 85;
/// Confidence attached to a result served from the content-hash cache.
pub const CACHED_CONFIDENCE: u8 = 90;

pub const UNKNOWN_VEGETABLE: &str = "Unknown";
pub const NONE_DETECTED: &str = "None detected";
pub const SAFE_RECOMMENDATION: &str = "This vegetable appears fresh and safe to eat.";
pub const UNSAFE_RECOMMENDATION: &str =
    "This vegetable may not be safe to eat. Consider discarding it.";

const VEGETABLE_LABELS: &[&str] = &["vegetable name:", "vegetable:"];
const SAFETY_LABELS: &[&str] = &["safe to eat:", "safety:", "safe:"];
const DISEASE_LABELS: &[&str] = &["disease name:", "disease:", "issues:", "problem:"];
const RECOMMENDATION_LABELS: &[&str] = &["recommendation:", "advice:", "suggest:"];

/// Fields recovered from model text before defaulting.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawFields {
    pub vegetable_name: Option<String>,
    pub safe_to_eat: Option<bool>,
    pub disease_name: Option<String>,
    pub recommendation: Option<String>,
}

/// Turn raw model output into a canonical [`ScanResult`].
///
/// Blank or absent content falls through to the deterministic mock keyed by
/// the image bytes, so this never fails.
pub fn normalize(raw: Option<&str>, image: &[u8], analyzed_at: DateTime<Utc>) -> ScanResult {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(content) => canonicalize(parse_fields(content), FRESH_CONFIDENCE, analyzed_at),
        None => mock_result(image, analyzed_at),
    }
}

/// JSON first (fenced block or whole text), then `Label: value` lines.
pub fn parse_fields(content: &str) -> RawFields {
    let candidate = extract_fenced_json(content).unwrap_or(content);
    match parse_json_fields(candidate) {
        Some(fields) => fields,
        None => {
            tracing::debug!("Model answer is not a JSON object, using line parser");
            parse_labelled_lines(content)
        }
    }
}

/// Text between ```` ```json ```` and the next ```` ``` ````. The block may
/// sit on one line or span several.
pub fn extract_fenced_json(content: &str) -> Option<&str> {
    let start = content.find("```json")?;
    let after_marker = &content[start + "```json".len()..];
    let end = after_marker.find("```")?;
    Some(after_marker[..end].trim())
}

fn parse_json_fields(candidate: &str) -> Option<RawFields> {
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    let obj = value.as_object()?;

    let mut fields = RawFields::default();
    for (key, v) in obj {
        match key_token(key).as_str() {
            "vegetablename" | "vegetable" => fields.vegetable_name = json_text(v),
            "safetoeat" | "safe" | "safety" => fields.safe_to_eat = json_flag(v),
            "diseasename" | "disease" => fields.disease_name = json_text(v),
            "recommendation" => fields.recommendation = json_text(v),
            _ => {}
        }
    }
    Some(fields)
}

/// `"Vegetable Name"`, `vegetable_name` and `VegetableName` all become
/// `vegetablename`.
fn key_token(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn json_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn json_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(!negated(s) && truthy(s)),
        _ => None,
    }
}

/// `"unsafe"`, `"Not safe"`, `"no"`, `"false"`
fn negated(s: &str) -> bool {
    let s = s.to_lowercase();
    s.contains("unsafe")
        || s
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|w| matches!(w, "not" | "no" | "false"))
}

fn truthy(s: &str) -> bool {
    let s = s.to_lowercase();
    ["true", "yes", "safe"].iter().any(|t| s.contains(t))
}

/// Line heuristic for answers that are not valid JSON. Later lines win when
/// a label repeats.
pub fn parse_labelled_lines(content: &str) -> RawFields {
    let mut fields = RawFields::default();

    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            continue;
        }
        let line = line.replace('"', "");
        let lower = line.to_lowercase();
        let value = match line.split_once(':') {
            Some((_, v)) => v.trim().trim_end_matches(',').trim().to_string(),
            None => continue,
        };

        if has_label(&lower, VEGETABLE_LABELS) {
            fields.vegetable_name = Some(value);
        } else if has_label(&lower, SAFETY_LABELS) {
            fields.safe_to_eat = Some(truthy(&value));
        } else if has_label(&lower, DISEASE_LABELS) {
            fields.disease_name = Some(value);
        } else if has_label(&lower, RECOMMENDATION_LABELS) {
            fields.recommendation = Some(value);
        }
    }
    fields
}

fn has_label(lower_line: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| lower_line.contains(l))
}

fn no_disease(disease: &str) -> bool {
    let d = disease.to_lowercase();
    d.is_empty()
        || d == "null"
        || ["none", "not detected", "n/a"].iter().any(|t| d.contains(t))
}

/// Apply the defaulting rules shared by every parse path.
pub fn canonicalize(
    fields: RawFields,
    confidence: u8,
    analyzed_at: DateTime<Utc>,
) -> ScanResult {
    let safe = fields.safe_to_eat.unwrap_or(false);

    let vegetable_name = fields
        .vegetable_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_VEGETABLE.to_string());

    let disease_name = fields
        .disease_name
        .filter(|d| !no_disease(d.trim()))
        .unwrap_or_else(|| NONE_DETECTED.to_string());

    let recommendation = fields
        .recommendation
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| {
            if safe {
                SAFE_RECOMMENDATION.to_string()
            } else {
                UNSAFE_RECOMMENDATION.to_string()
            }
        });

    ScanResult {
        vegetable_name,
        safe_to_eat: safe,
        disease_name,
        recommendation,
        confidence,
        analysis_date: analyzed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_with_nulls() {
        let raw = "Here is the analysis:\n```json\n{\"Vegetable Name\":\"Tomato\",\"Safe to Eat\":true,\"Disease Name\":null,\"Recommendation\":null}\n```\n";
        let now = Utc::now();
        let r = normalize(Some(raw), b"img", now);
        assert_eq!(r.vegetable_name, "Tomato");
        assert!(r.safe_to_eat);
        assert_eq!(r.disease_name, NONE_DETECTED);
        assert_eq!(r.recommendation, SAFE_RECOMMENDATION);
        assert_eq!(r.confidence, FRESH_CONFIDENCE);
        assert_eq!(r.analysis_date, now);
    }

    #[test]
    fn bare_json_with_snake_case_keys() {
        let raw = r#"{"vegetable_name": "Potato", "safe_to_eat": "no", "disease_name": "Late Blight", "recommendation": "Discard it."}"#;
        let r = normalize(Some(raw), b"img", Utc::now());
        assert_eq!(r.vegetable_name, "Potato");
        assert!(!r.safe_to_eat);
        assert_eq!(r.disease_name, "Late Blight");
        assert_eq!(r.recommendation, "Discard it.");
    }

    #[test]
    fn safety_string_is_truthy() {
        let raw = r#"{"Vegetable Name": "Carrot", "Safe to Eat": "Yes, safe"}"#;
        let r = normalize(Some(raw), b"img", Utc::now());
        assert!(r.safe_to_eat);
        assert_eq!(r.recommendation, SAFE_RECOMMENDATION);
    }

    #[test]
    fn plain_lines_are_parsed() {
        let r = normalize(Some("Vegetable: Carrot\nSafe: yes\n"), b"img", Utc::now());
        assert_eq!(r.vegetable_name, "Carrot");
        assert!(r.safe_to_eat);
        assert_eq!(r.disease_name, NONE_DETECTED);
        assert_eq!(r.confidence, FRESH_CONFIDENCE);
    }

    #[test]
    fn malformed_json_falls_back_to_lines() {
        let raw = "```json\n{\n  \"Vegetable Name\": \"Cucumber\",\n  \"Safe to Eat\": false,\n  \"Disease Name\": \"Powdery Mildew\",\n  \"Recommendation\": \"Do not eat\",,\n}\n```";
        let r = normalize(Some(raw), b"img", Utc::now());
        assert_eq!(r.vegetable_name, "Cucumber");
        assert!(!r.safe_to_eat);
        assert_eq!(r.disease_name, "Powdery Mildew");
        assert_eq!(r.recommendation, "Do not eat");
    }

    #[test]
    fn non_object_json_uses_line_parser() {
        let r = normalize(Some("[1, 2, 3]"), b"img", Utc::now());
        assert_eq!(r.vegetable_name, UNKNOWN_VEGETABLE);
        assert!(!r.safe_to_eat);
        assert_eq!(r.recommendation, UNSAFE_RECOMMENDATION);
    }

    #[test]
    fn disease_exclusions_become_none_detected() {
        for d in ["None", "not detected", "N/A", "none found", "null", ""] {
            let fields = RawFields {
                disease_name: Some(d.to_string()),
                ..Default::default()
            };
            assert_eq!(canonicalize(fields, 85, Utc::now()).disease_name, NONE_DETECTED);
        }
    }

    #[test]
    fn unsafe_without_recommendation_uses_unsafe_text() {
        let raw = "Vegetable Name: Lettuce\nSafe to Eat: false\nDisease: Bacterial Spot";
        let r = normalize(Some(raw), b"img", Utc::now());
        assert_eq!(r.vegetable_name, "Lettuce");
        assert_eq!(r.disease_name, "Bacterial Spot");
        assert_eq!(r.recommendation, UNSAFE_RECOMMENDATION);
    }

    #[test]
    fn blank_or_missing_content_uses_mock() {
        let now = Utc::now();
        let expected = mock_result(b"abc", now);
        assert_eq!(normalize(None, b"abc", now), expected);
        assert_eq!(normalize(Some("  \n "), b"abc", now), expected);
    }

    #[test]
    fn single_line_fence_with_trailing_text() {
        let fenced = r#"```json {"Vegetable Name":"Tomato","Safe to Eat":true} ```"#;
        for raw in [fenced.to_string(), format!("{fenced}\nThanks")] {
            let r = normalize(Some(&raw), b"img", Utc::now());
            assert_eq!(r.vegetable_name, "Tomato", "{raw}");
            assert!(r.safe_to_eat, "{raw}");
        }
        assert_eq!(
            extract_fenced_json("```json {\"a\":1} ```\nmore\n```"),
            Some("{\"a\":1}")
        );
    }

    #[test]
    fn negative_safety_strings_in_json() {
        for flag in ["Not safe", "unsafe", "No", "false", "not safe to eat"] {
            let raw = format!(r#"{{"Vegetable Name": "Potato", "Safe to Eat": "{flag}"}}"#);
            let r = normalize(Some(&raw), b"img", Utc::now());
            assert!(!r.safe_to_eat, "{flag}");
            assert_eq!(r.recommendation, UNSAFE_RECOMMENDATION);
        }
        for flag in ["Yes", "safe", "TRUE", "yes, it is safe"] {
            let raw = format!(r#"{{"Safe to Eat": "{flag}"}}"#);
            assert!(normalize(Some(&raw), b"img", Utc::now()).safe_to_eat, "{flag}");
        }
    }

    #[test]
    fn unclosed_fence_is_ignored() {
        assert_eq!(extract_fenced_json("```json\n{\"a\":1}"), None);
        assert_eq!(extract_fenced_json("x\n```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
    }
}
