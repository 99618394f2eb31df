//! Content-Type driven request encoding and response decoding.
//!
//! Outbound bodies are chosen by a substring match on the request
//! `Content-Type`; inbound bodies are decoded by the response `Content-Type`.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// How a request body is put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyEncoding {
    /// Fully encoded payload.
    Encoded(Bytes),
    /// Each pair becomes a multipart field; the caller drives the builder.
    Multipart(Vec<(String, String)>),
    /// No body is written.
    None,
}

/// Pick and apply the encoding for `data` under `content_type`.
pub fn encode_request_body(content_type: Option<&str>, data: &Value) -> BodyEncoding {
    let Some(content_type) = content_type else {
        return BodyEncoding::None;
    };

    if content_type.contains(APPLICATION_JSON) {
        BodyEncoding::Encoded(encode_json(data))
    } else if content_type.contains(FORM_URLENCODED) {
        BodyEncoding::Encoded(Bytes::from(encode_form(data)))
    } else if content_type.contains(MULTIPART_FORM_DATA) {
        BodyEncoding::Multipart(multipart_fields(data))
    } else {
        BodyEncoding::None
    }
}

/// Compact JSON serialization of the whole body value.
pub fn encode_json(data: &Value) -> Bytes {
    // Serializing a `Value` into memory cannot fail.
    Bytes::from(serde_json::to_vec(data).unwrap_or_default())
}

/// `key=value&...` in mapping order, skipping null values. Only values are
/// percent-encoded; keys go out as given.
pub fn encode_form(data: &Value) -> String {
    let Value::Object(map) = data else {
        return String::new();
    };
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let text = value_to_text(value);
            let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
            format!("{}={}", key, encoded)
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn multipart_fields(data: &Value) -> Vec<(String, String)> {
    match data {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), value_to_text(value)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Text form of a body or parameter value: strings raw, everything else as
/// its JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decoded response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Text(String),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ResponseData::Object(map) => Value::Object(map),
            ResponseData::Array(items) => Value::Array(items),
            ResponseData::Text(s) => Value::String(s),
        }
    }
}

/// Decode a response body by its `Content-Type`.
///
/// JSON content types try an object, then an array, then fall back to the
/// raw text without raising an error.
pub fn decode_response_body(content_type: Option<&str>, body: &[u8]) -> ResponseData {
    let text = read_text(body);

    let is_json = content_type.is_some_and(|ct| ct.contains(APPLICATION_JSON));
    if !is_json {
        return ResponseData::Text(text);
    }

    if let Ok(object) = serde_json::from_str::<Map<String, Value>>(&text) {
        return ResponseData::Object(object);
    }
    if let Ok(array) = serde_json::from_str::<Vec<Value>>(&text) {
        return ResponseData::Array(array);
    }
    tracing::debug!("response declared JSON but did not parse, returning text");
    ResponseData::Text(text)
}

/// Body bytes as UTF-8 text with every line terminator removed.
pub fn read_text(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_encoding_is_compact() {
        let data = json!({"name": "widget", "tags": ["a", "b"], "count": 2});
        let encoded = encode_request_body(Some("application/json; charset=utf-8"), &data);
        assert_eq!(
            encoded,
            BodyEncoding::Encoded(Bytes::from_static(
                br#"{"name":"widget","tags":["a","b"],"count":2}"#
            ))
        );
    }

    #[test]
    fn test_json_round_trip_object_and_array() {
        let object = json!({"a": 1, "b": {"c": [true, null]}});
        let bytes = encode_json(&object);
        assert_eq!(
            decode_response_body(Some(APPLICATION_JSON), &bytes).into_value(),
            object
        );

        let array = json!([1, "two", {"three": 3}]);
        let bytes = encode_json(&array);
        assert_eq!(
            decode_response_body(Some(APPLICATION_JSON), &bytes).into_value(),
            array
        );
    }

    #[test]
    fn test_form_encoding_skips_nulls() {
        let data = json!({"a": "1", "b": "x y", "c": null});
        assert_eq!(encode_form(&data), "a=1&b=x+y");
    }

    #[test]
    fn test_form_encoding_trailing_null_leaves_no_separator() {
        let data = json!({"a": "1", "c": null});
        assert_eq!(encode_form(&data), "a=1");
    }

    #[test]
    fn test_form_keys_are_sent_as_given() {
        let data = json!({"user[name]": "a b", "tag": "c/d"});
        assert_eq!(encode_form(&data), "user[name]=a+b&tag=c%2Fd");
    }

    #[test]
    fn test_form_encoding_renders_scalars() {
        let data = json!({"n": 5, "ok": true, "s": "a&b"});
        assert_eq!(encode_form(&data), "n=5&ok=true&s=a%26b");
    }

    #[test]
    fn test_multipart_fields_in_order() {
        let data = json!({"z": "last?", "a": 1});
        match encode_request_body(Some("multipart/form-data"), &data) {
            BodyEncoding::Multipart(fields) => assert_eq!(
                fields,
                vec![
                    ("z".to_string(), "last?".to_string()),
                    ("a".to_string(), "1".to_string())
                ]
            ),
            other => panic!("expected multipart, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_or_missing_content_type_writes_nothing() {
        let data = json!({"a": 1});
        assert_eq!(encode_request_body(Some("text/plain"), &data), BodyEncoding::None);
        assert_eq!(encode_request_body(None, &data), BodyEncoding::None);
    }

    #[test]
    fn test_content_type_match_is_case_sensitive() {
        let data = json!({"a": 1});
        assert_eq!(
            encode_request_body(Some("Application/JSON"), &data),
            BodyEncoding::None
        );
    }

    #[test]
    fn test_decode_invalid_json_falls_back_to_text() {
        let data = decode_response_body(Some("application/json"), b"not json");
        assert_eq!(data, ResponseData::Text("not json".to_string()));
    }

    #[test]
    fn test_decode_strips_line_terminators() {
        let data = decode_response_body(Some("text/plain"), b"line one\r\nline two\nend\r");
        assert_eq!(data.as_text(), Some("line oneline twoend"));
    }

    #[test]
    fn test_decode_without_content_type_is_text() {
        let data = decode_response_body(None, br#"{"a":1}"#);
        assert_eq!(data, ResponseData::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_decode_multiline_json() {
        let data = decode_response_body(Some("application/json"), b"{\n  \"a\": 1\n}\n");
        assert_eq!(data.into_value(), json!({"a": 1}));
    }
}
