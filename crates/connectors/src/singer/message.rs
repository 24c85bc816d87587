use crate::source::SourceEvent;
use serde::Deserialize;

/// One line of Singer output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SingerMessage {
    Schema {
        stream: String,
        schema: serde_json::Value,
        #[serde(default)]
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: serde_json::Value,
        #[serde(default)]
        time_extracted: Option<String>,
    },
    State {
        value: serde_json::Value,
    },
    ActivateVersion {
        stream: String,
        version: i64,
    },
}

impl SingerMessage {
    /// Event carried by this message; `ACTIVATE_VERSION` carries none.
    pub fn into_event(self) -> Option<SourceEvent> {
        match self {
            SingerMessage::Schema {
                stream,
                schema,
                key_properties,
            } => Some(SourceEvent::StreamStart {
                stream,
                schema,
                key_properties,
            }),
            SingerMessage::Record { stream, record, .. } => Some(SourceEvent::Record {
                stream,
                record: record.into(),
            }),
            SingerMessage::State { value } => Some(SourceEvent::State(value)),
            SingerMessage::ActivateVersion { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    #[test]
    fn test_parse_messages() {
        let schema: SingerMessage = serde_json::from_str(
            r#"{"type":"SCHEMA","stream":"users","schema":{"type":"object"},"key_properties":["id"]}"#,
        )
        .unwrap();
        assert!(matches!(
            schema.into_event(),
            Some(SourceEvent::StreamStart { stream, key_properties, .. })
                if stream == "users" && key_properties == vec!["id".to_string()]
        ));

        let record: SingerMessage =
            serde_json::from_str(r#"{"type":"RECORD","stream":"users","record":{"id":1}}"#)
                .unwrap();
        match record.into_event() {
            Some(SourceEvent::Record { stream, record }) => {
                assert_eq!(stream, "users");
                assert_eq!(record.as_map().unwrap()["id"], Value::Int(1));
            }
            other => panic!("unexpected {other:?}"),
        }

        let activate: SingerMessage =
            serde_json::from_str(r#"{"type":"ACTIVATE_VERSION","stream":"users","version":3}"#)
                .unwrap();
        assert_eq!(activate.into_event(), None);
    }
}
