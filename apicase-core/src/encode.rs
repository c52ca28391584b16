//! Transport-facing value encoding.
//!
//! JSON values headed for URLs, headers, and form fields need textual
//! renderings that survive the trip: booleans and nulls become their JSON
//! literal spellings rather than language-native ones, and path segments
//! consisting solely of dots are percent-encoded so routers cannot mistake
//! them for relative path navigation.

use serde_json::Value as JsonValue;

/// Raw bytes destined for a request body or a multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binary(Vec<u8>);

impl Binary {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// One field of a form payload. Multipart parts backed by `binary`-format
/// schema properties carry raw bytes; everything else is text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    Text(String),
    Bytes(Vec<u8>),
}

/// Renders a value as field text: strings stay as they are, numbers use
/// their decimal form, booleans and nulls use JSON literal spelling, and
/// composites use compact JSON.
pub fn literal_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        JsonValue::Bool(true) => "true".to_string(),
        JsonValue::Bool(false) => "false".to_string(),
        JsonValue::Null => "null".to_string(),
        JsonValue::Number(number) => number.to_string(),
        composite => serde_json::to_string(composite).unwrap_or_default(),
    }
}

/// Deeply rewrites booleans and nulls into their JSON literal text while
/// preserving container structure. Used for query parameters, where
/// transports would otherwise stringify them in their own dialect.
pub fn jsonify_literals(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Bool(true) => JsonValue::from("true"),
        JsonValue::Bool(false) => JsonValue::from("false"),
        JsonValue::Null => JsonValue::from("null"),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(jsonify_literals).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), jsonify_literals(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Percent-encodes one path segment. Segments that are exactly `.` or `..`
/// are fully encoded so they cannot act as relative navigation; a leading
/// dot inside a longer segment is left alone.
pub fn quote_path_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => urlencoding::encode(segment).into_owned(),
    }
}

/// Renders a path parameter value into its encoded segment form.
pub fn render_path_value(value: &JsonValue) -> String {
    quote_path_segment(&literal_text(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_nulls_become_literal_text() {
        assert_eq!(jsonify_literals(&json!({"foo": null})), json!({"foo": "null"}));
    }

    #[test]
    fn nested_booleans_become_literal_text() {
        assert_eq!(
            jsonify_literals(&json!([{"foo": true}])),
            json!([{"foo": "true"}])
        );
    }

    #[test]
    fn numbers_and_strings_pass_through() {
        assert_eq!(
            jsonify_literals(&json!({"n": 42, "s": "text"})),
            json!({"n": 42, "s": "text"})
        );
    }

    #[test]
    fn dot_segments_are_fully_encoded() {
        assert_eq!(quote_path_segment("."), "%2E");
        assert_eq!(quote_path_segment(".."), "%2E%2E");
        assert_eq!(quote_path_segment(".foo"), ".foo");
    }

    #[test]
    fn path_values_render_scalars_and_composites() {
        assert_eq!(render_path_value(&json!(true)), "true");
        assert_eq!(render_path_value(&json!(7)), "7");
        assert_eq!(render_path_value(&json!("a b")), "a%20b");
        assert_eq!(render_path_value(&json!({"a": 1})), "%7B%22a%22%3A1%7D");
    }

    #[test]
    fn form_text_uses_json_literals() {
        assert_eq!(literal_text(&json!(true)), "true");
        assert_eq!(literal_text(&json!(null)), "null");
        assert_eq!(literal_text(&json!(2.5)), "2.5");
        assert_eq!(literal_text(&json!([1, 2])), "[1,2]");
    }
}
