//! Parsing of the model's final verdict.
//!
//! Models are asked for bare JSON but often wrap it in a code fence or in
//! prose. The parser accepts all three shapes and nothing else.

use serde_json::{Map, Value};

/// Structured verdict returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub video_id: Option<String>,
    pub reason: String,
    pub error: Option<String>,
}

/// Parses model output into a verdict. Returns `None` when no JSON object can
/// be extracted.
pub fn parse_verdict(text: &str) -> Option<Verdict> {
    extract_json_object(text).map(|object| Verdict::from_object(&object))
}

/// Extracts the first JSON object from plain, fenced, or prose-wrapped text.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = fenced_block(trimmed).unwrap_or(trimmed);

    if let Ok(Value::Object(object)) = serde_json::from_str(candidate) {
        return Some(object);
    }

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&candidate[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let re = regex_lite::Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)```").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl Verdict {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            success: non_empty_str(object, "status") == Some("success"),
            video_id: non_empty_str(object, "videoId").map(str::to_string),
            reason: non_empty_str(object, "reason")
                .or_else(|| non_empty_str(object, "notes"))
                .unwrap_or_default()
                .to_string(),
            error: non_empty_str(object, "error")
                .filter(|e| *e != "null")
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> Verdict {
        Verdict {
            success: true,
            video_id: Some("abc".into()),
            reason: String::new(),
            error: None,
        }
    }

    #[test]
    fn test_plain_json() {
        assert_eq!(
            parse_verdict(r#"{"status":"success","videoId":"abc"}"#),
            Some(expected())
        );
    }

    #[test]
    fn test_fenced_json() {
        assert_eq!(
            parse_verdict("```json\n{\"status\":\"success\",\"videoId\":\"abc\"}\n```"),
            Some(expected())
        );
        assert_eq!(
            parse_verdict("Here you go:\n```\n{\"status\":\"success\",\"videoId\":\"abc\"}\n```"),
            Some(expected())
        );
    }

    #[test]
    fn test_json_inside_prose() {
        assert_eq!(
            parse_verdict(r#"Sure! {"status":"success","videoId":"abc"} thanks"#),
            Some(expected())
        );
    }

    #[test]
    fn test_not_json() {
        assert_eq!(parse_verdict("not json at all"), None);
        assert_eq!(parse_verdict(""), None);
        assert_eq!(parse_verdict("} backwards {"), None);
        assert_eq!(parse_verdict("[1, 2, 3]"), None);
    }

    #[test]
    fn test_failure_fields() {
        let verdict = parse_verdict(
            r#"{"status":"failure","videoId":null,"notes":"only covers found","error":"no_match"}"#,
        )
        .unwrap();

        assert!(!verdict.success);
        assert!(verdict.video_id.is_none());
        assert_eq!(verdict.reason, "only covers found");
        assert_eq!(verdict.error.as_deref(), Some("no_match"));
    }

    #[test]
    fn test_unknown_status_is_failure() {
        let verdict = parse_verdict(r#"{"status":"maybe","videoId":"abc"}"#).unwrap();
        assert!(!verdict.success);
        assert_eq!(verdict.video_id.as_deref(), Some("abc"));
    }
}
