//! Response normalisation: turn whatever a collaborator sent back into text.
//!
//! Collaborators answer in several shapes: a JSON object with the text under
//! one of a few keys, a JSON array of such objects (one per page), a bare JSON
//! scalar, or plain text. Decoding happens once into a tagged [`Payload`] and
//! each variant has its own rule, so no branch ever has to guess at the type.
//!
//! Every path ends in a `String`; nothing here can fail.

use serde_json::{Map, Value};

/// Field names checked in an OCR reply, in priority order.
pub const DOCUMENT_TEXT_HINTS: &[&str] = &["text", "result"];

/// Field names checked in an analysis reply, in priority order.
pub const ANALYSIS_REPLY_HINTS: &[&str] = &["reply", "output"];

/// Joins the per-item texts of a sequence payload.
pub const ITEM_SEPARATOR: &str = "\n\n";

/// What kind of text the payload is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Extracted document text from the OCR service.
    DocumentText,
    /// Comparison narrative from the analysis service.
    AnalysisReply,
}

impl Capability {
    pub fn hints(self) -> &'static [&'static str] {
        match self {
            Capability::DocumentText => DOCUMENT_TEXT_HINTS,
            Capability::AnalysisReply => ANALYSIS_REPLY_HINTS,
        }
    }
}

/// A response body after the decode-or-fallback step.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Object(Map<String, Value>),
    Sequence(Vec<Value>),
    Scalar(Value),
    /// Body that is not JSON; kept verbatim.
    RawText(String),
}

impl Payload {
    /// Decode `body` as JSON, falling back to the raw text.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Payload::RawText(body.to_string()),
        }
    }

    /// Decode raw bytes; invalid UTF-8 is replaced lossily before the fallback.
    pub fn decode_bytes(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Payload::RawText(String::from_utf8_lossy(body).into_owned()),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Object(map),
            Value::Array(items) => Payload::Sequence(items),
            scalar => Payload::Scalar(scalar),
        }
    }

    /// Reduce the payload to a single string.
    pub fn into_text(self, hints: &[&str]) -> String {
        match self {
            Payload::Object(map) => pick_hinted(&map, hints),
            Payload::Sequence(items) => items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => pick_hinted(map, hints),
                    other => stringify(other),
                })
                .collect::<Vec<_>>()
                .join(ITEM_SEPARATOR),
            Payload::Scalar(value) => stringify(&value),
            Payload::RawText(text) => text,
        }
    }
}

/// Normalise a text body using an explicit hint list.
pub fn normalize(body: &str, hints: &[&str]) -> String {
    Payload::decode(body).into_text(hints)
}

/// Normalise a byte body using an explicit hint list.
pub fn normalize_bytes(body: &[u8], hints: &[&str]) -> String {
    Payload::decode_bytes(body).into_text(hints)
}

/// Normalise a byte body for the given capability.
pub fn normalize_for(body: &[u8], capability: Capability) -> String {
    normalize_bytes(body, capability.hints())
}

/// First hinted field with a non-empty value, else the whole object.
fn pick_hinted(map: &Map<String, Value>, hints: &[&str]) -> String {
    hints
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !is_empty(value))
        .map(stringify)
        .unwrap_or_else(|| Value::Object(map.clone()).to_string())
}

/// Strings verbatim, everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ocr(body: &str) -> String {
        normalize(body, DOCUMENT_TEXT_HINTS)
    }

    #[test]
    fn object_text_field_returned_unmodified() {
        assert_eq!(ocr(r#"{"text":"  Invoice\n#42  "}"#), "  Invoice\n#42  ");
    }

    #[test]
    fn object_result_field_used_when_text_absent() {
        assert_eq!(ocr(r#"{"result":"B"}"#), "B");
    }

    #[test]
    fn first_hint_wins() {
        assert_eq!(ocr(r#"{"result":"second","text":"first"}"#), "first");
    }

    #[test]
    fn empty_hint_value_falls_through() {
        assert_eq!(ocr(r#"{"text":"","result":"fallback"}"#), "fallback");
        assert_eq!(ocr(r#"{"text":null,"result":"fallback"}"#), "fallback");
    }

    #[test]
    fn object_without_hints_is_stringified() {
        assert_eq!(ocr(r#"{"pages":2}"#), r#"{"pages":2}"#);
        assert_eq!(ocr(r#"{"text":""}"#), r#"{"text":""}"#);
    }

    #[test]
    fn non_string_hint_value_is_rendered_as_json() {
        assert_eq!(ocr(r#"{"text":["a","b"]}"#), r#"["a","b"]"#);
    }

    #[test]
    fn sequence_joined_with_blank_line_in_order() {
        let body = r#"[{"text":"page one"},{"result":"page two"},{"other":1},"loose",7]"#;
        assert_eq!(
            ocr(body),
            "page one\n\npage two\n\n{\"other\":1}\n\nloose\n\n7"
        );
    }

    #[test]
    fn empty_sequence_is_empty_text() {
        assert_eq!(ocr("[]"), "");
    }

    #[test]
    fn scalars_are_stringified() {
        assert_eq!(ocr(r#""just a string""#), "just a string");
        assert_eq!(ocr("42"), "42");
        assert_eq!(ocr("true"), "true");
        assert_eq!(ocr("null"), "null");
    }

    #[test]
    fn non_json_returned_verbatim() {
        for body in ["plain OCR text", "", "{not json", "Total: 1,234.00\n"] {
            assert_eq!(ocr(body), body);
        }
    }

    #[test]
    fn invalid_utf8_bytes_decoded_lossily() {
        let body = [b'o', b'k', 0xff];
        assert_eq!(normalize_bytes(&body, DOCUMENT_TEXT_HINTS), "ok\u{fffd}");
    }

    #[test]
    fn analysis_capability_uses_reply_then_output() {
        assert_eq!(normalize_for(br#"{"reply":"Match"}"#, Capability::AnalysisReply), "Match");
        assert_eq!(
            normalize_for(br#"{"output":"Mismatch on line 3"}"#, Capability::AnalysisReply),
            "Mismatch on line 3"
        );
        assert_eq!(
            normalize_for(br#"{"text":"ignored"}"#, Capability::AnalysisReply),
            r#"{"text":"ignored"}"#
        );
    }

    #[test]
    fn decode_tags_shapes() {
        assert!(matches!(Payload::decode("{}"), Payload::Object(_)));
        assert!(matches!(Payload::decode("[1]"), Payload::Sequence(_)));
        assert!(matches!(Payload::decode("1.5"), Payload::Scalar(_)));
        assert!(matches!(Payload::decode("hello"), Payload::RawText(_)));
    }
}
