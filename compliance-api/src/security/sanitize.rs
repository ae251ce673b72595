//! Markup stripping for free-text fields.
//!
//! Every tag and attribute is removed, leaving only visible text. Script and
//! style bodies are dropped along with their tags. Text is HTML-escaped on
//! output so the result is safe to echo into a page.

use ammonia::Builder;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

static TEXT_ONLY: OnceLock<Builder<'static>> = OnceLock::new();

fn text_only() -> &'static Builder<'static> {
    TEXT_ONLY.get_or_init(|| {
        let mut builder = Builder::empty();
        builder.clean_content_tags(HashSet::from(["script", "style"]));
        builder
    })
}

/// Strip all markup from `text`
pub fn sanitize_text(text: &str) -> String {
    text_only().clean(text).to_string()
}

/// Strip all markup, passing `None` through unchanged
pub fn sanitize(text: Option<&str>) -> Option<String> {
    text.map(sanitize_text)
}

/// Sanitize the named string fields of a record, returning a new record
pub fn sanitize_fields(record: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    let mut result = record.clone();
    for field in fields {
        if let Some(Value::String(value)) = record.get(*field) {
            result.insert((*field).to_string(), Value::String(sanitize_text(value)));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(sanitize_text("Certificate expires in March"), "Certificate expires in March");
    }

    #[test]
    fn test_none_passes_through() {
        assert_eq!(sanitize(None), None);
        assert_eq!(sanitize(Some("")), Some(String::new()));
    }

    #[test]
    fn test_script_removed_with_content() {
        assert_eq!(
            sanitize_text("<b>Hello</b> <script>alert('xss')</script>world"),
            "Hello world"
        );
    }

    #[test]
    fn test_sanitize_fields() {
        let record = match json!({ "notes": "<i>ok</i>", "count": 3 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let cleaned = sanitize_fields(&record, &["notes", "count", "absent"]);
        assert_eq!(cleaned["notes"], json!("ok"));
        assert_eq!(cleaned["count"], json!(3));
        assert_eq!(record["notes"], json!("<i>ok</i>"));
    }
}
