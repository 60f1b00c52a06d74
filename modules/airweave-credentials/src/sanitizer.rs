//! Redacts credential maps for safe logging, ported from
//! `original_source/backend/airweave/core/credential_sanitizer.py`. Used
//! wherever a decrypted credential map would otherwise land in a `tracing`
//! field or an `AirweaveError` message.

use std::collections::BTreeMap;

use serde_json::Value;

const SENSITIVE_SUBSTRINGS: &[&str] = &[
    "token", "key", "secret", "password", "credential", "auth", "access", "refresh", "bearer",
    "private", "session", "cookie",
];

fn is_sensitive_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_SUBSTRINGS.iter().any(|pattern| lower.contains(pattern))
}

/// A short, non-reversible description of a single credential value: never
/// the value itself, just its shape.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.len() <= 8 => format!("<redacted:{} chars>", s.len()),
        Value::String(s) => {
            let preview_head: String = s.chars().take(3).collect();
            let preview_tail: String = s.chars().rev().take(2).collect::<String>().chars().rev().collect();
            format!("<redacted:{} chars:{preview_head}...{preview_tail}>", s.len())
        }
        Value::Number(_) => "<redacted number>".to_string(),
        Value::Bool(b) => format!("<redacted bool:{b}>"),
        Value::Null => "<redacted:null>".to_string(),
        Value::Array(_) => "<redacted array>".to_string(),
        Value::Object(_) => "<redacted object>".to_string(),
    }
}

/// Sanitizes every value in a credential map, suitable for inclusion in a
/// log line or error message.
pub fn sanitize_map(credentials: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    credentials.iter().map(|(k, v)| (k.clone(), sanitize_value(v))).collect()
}

/// A one-line summary distinguishing sensitive from non-sensitive field
/// names, without exposing any value — mirrors `get_safe_credential_summary`.
pub fn safe_summary(credentials: &BTreeMap<String, Value>) -> String {
    if credentials.is_empty() {
        return "no credentials".to_string();
    }
    let (sensitive, non_sensitive): (Vec<_>, Vec<_>) =
        credentials.keys().partition(|k| is_sensitive_field(k));

    format!(
        "{} fields ({} sensitive, {} non-sensitive: {:?})",
        credentials.len(),
        sensitive.len(),
        non_sensitive.len(),
        non_sensitive
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_redact_to_length_only() {
        assert_eq!(sanitize_value(&Value::String("abc".to_string())), "<redacted:3 chars>");
    }

    #[test]
    fn long_strings_keep_head_and_tail_preview() {
        let redacted = sanitize_value(&Value::String("sk-ant-abcdefgh1234".to_string()));
        assert!(redacted.starts_with("<redacted:20 chars:sk-"));
        assert!(redacted.ends_with("34>"));
    }

    #[test]
    fn summary_never_includes_field_values() {
        let mut map = BTreeMap::new();
        map.insert("access_token".to_string(), Value::String("super-secret-value".to_string()));
        map.insert("instance_url".to_string(), Value::String("https://example.com".to_string()));

        let summary = safe_summary(&map);
        assert!(!summary.contains("super-secret-value"));
        assert!(summary.contains("instance_url"));
    }
}
