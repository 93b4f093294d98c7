use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::errors::ExtractionError;

static JSON_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json\s*").expect("valid regex"));

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\s*").expect("valid regex"));

/// Parse the JSON object embedded in noisy provider text.
///
/// Fences tagged `json` (or untagged) are dropped first, then the slice from
/// the first `{` to the last `}` is parsed as `T`. Prose before or after the
/// object is ignored. Only the parse is checked here; field-level validation
/// belongs to the caller.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractionError> {
    let slice = locate_object(raw)?;
    serde_json::from_str::<T>(&slice)
        .map_err(|e| ExtractionError::MalformedPayload(format!("invalid JSON object: {e}")))
}

/// The unparsed `{ ... }` candidate, with fences removed.
fn locate_object(raw: &str) -> Result<String, ExtractionError> {
    let unfenced = JSON_FENCE_RE.replace_all(raw, "");
    let unfenced = FENCE_RE.replace_all(&unfenced, "");

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(first), Some(last)) if first < last => Ok(unfenced[first..=last].to_string()),
        _ => Err(ExtractionError::MalformedPayload(
            "no balanced { ... } pair in response".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn recovers_object_surrounded_by_prose() {
        let raw = "Sure! Here is the data you asked for:\n{\"name\": \"x\", \"n\": {\"deep\": [1, 2]}}\nLet me know if you need more.";
        let v: Value = extract_json(raw).unwrap();
        assert_eq!(v, json!({"name": "x", "n": {"deep": [1, 2]}}));
    }

    #[test]
    fn strips_json_and_untagged_fences() {
        let tagged = "```json\n{\"name\": \"a\"}\n```";
        let untagged = "```\n{\"name\": \"b\"}\n```\nThat's all.";
        assert_eq!(extract_json::<Named>(tagged).unwrap().name, "a");
        assert_eq!(extract_json::<Named>(untagged).unwrap().name, "b");
    }

    #[test]
    fn missing_braces_fail() {
        assert!(matches!(
            extract_json::<Value>("no json here"),
            Err(ExtractionError::MalformedPayload(_))
        ));
        assert!(matches!(
            extract_json::<Value>("{ \"open\": true"),
            Err(ExtractionError::MalformedPayload(_))
        ));
        assert!(matches!(
            extract_json::<Value>("\"close\": true }"),
            Err(ExtractionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn open_after_close_fails() {
        assert!(matches!(
            extract_json::<Value>("} stray { "),
            Err(ExtractionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn unparseable_slice_fails() {
        assert!(matches!(
            extract_json::<Value>("{ not: valid, json }"),
            Err(ExtractionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_malformed() {
        assert!(matches!(
            extract_json::<Named>("{\"title\": \"x\"}"),
            Err(ExtractionError::MalformedPayload(_))
        ));
    }
}
