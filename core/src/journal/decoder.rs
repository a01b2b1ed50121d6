use serde_json::Value;

use super::event::{RawEvent, parse_timestamp};

/// Why a journal line could not become a [`RawEvent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("blank line")]
    Blank,
    #[error("malformed JSON: {0}")]
    Malformed(String),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing or non-string `event` field")]
    MissingKind,
}

/// Decode one journal line. Pure: no logging, no state.
///
/// The `event` key is lifted into [`RawEvent::kind`] and removed from the map.
/// `timestamp` is parsed opportunistically and left in the map untouched; a
/// missing or unparsable timestamp is not a failure.
pub fn decode_line(line: &str) -> Result<RawEvent, DecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Blank);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match fields.remove("event") {
        Some(Value::String(kind)) if !kind.is_empty() => kind,
        _ => return Err(DecodeError::MissingKind),
    };

    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    Ok(RawEvent {
        kind,
        timestamp,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_record() {
        let event = decode_line(r#"{"event":"MissionAccepted","id":"M1","target":5}"#).unwrap();
        assert_eq!(event.kind, "MissionAccepted");
        assert_eq!(event.timestamp, None);
        assert_eq!(event.str_field(&["id"]), Some("M1"));
        assert_eq!(event.u64_field(&["target"]), Some(5));
        assert!(!event.fields.contains_key("event"));
    }

    #[test]
    fn test_decode_parses_timestamp() {
        let event =
            decode_line(r#"{"timestamp":"2024-01-01T10:00:00Z","event":"FSDJump"}"#).unwrap();
        assert_eq!(
            event.timestamp.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-01-01T10:00:00+00:00")
        );
    }

    #[test]
    fn test_bad_timestamp_is_not_a_failure() {
        let event = decode_line(r#"{"timestamp":"yesterday","event":"FSDJump"}"#).unwrap();
        assert_eq!(event.timestamp, None);
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(decode_line("   "), Err(DecodeError::Blank));
        assert!(matches!(
            decode_line(r#"{"event":"Truncat"#),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(decode_line("[1,2,3]"), Err(DecodeError::NotAnObject));
        assert_eq!(decode_line(r#"{"id":"M1"}"#), Err(DecodeError::MissingKind));
        assert_eq!(decode_line(r#"{"event":7}"#), Err(DecodeError::MissingKind));
        assert_eq!(decode_line(r#"{"event":""}"#), Err(DecodeError::MissingKind));
    }

    #[test]
    fn test_decode_multibyte_content() {
        let event = decode_line(r#"{"event":"Location","StarSystem":"Ésprit ☄"}"#).unwrap();
        assert_eq!(event.str_field(&["StarSystem"]), Some("Ésprit ☄"));
    }

    #[test]
    fn test_trailing_carriage_return_is_tolerated() {
        assert!(decode_line("{\"event\":\"Music\"}\r").is_ok());
    }
}
