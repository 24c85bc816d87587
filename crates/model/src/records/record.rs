use crate::core::{
    sanitize::sanitize,
    value::{Map, Value},
};
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Record must be a mapping of field names to values, found {found}")]
    NotAMapping { found: &'static str },
}

/// One unit of data: field names mapped to values, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map,
}

impl Record {
    pub fn new(fields: Map) -> Self {
        Record { fields }
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    pub fn into_fields(self) -> Map {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.fields
            .iter()
            .map(|(k, v)| k.len() + 3 + v.size_bytes())
            .sum::<usize>()
            + 2
    }

    /// Returns the record with every text value free of surrogates.
    pub fn sanitized(self) -> Record {
        Record {
            fields: self
                .fields
                .into_iter()
                .map(|(k, v)| (k, sanitize(v)))
                .collect(),
        }
    }

    pub fn has_unchecked_text(&self) -> bool {
        self.fields.values().any(Value::has_unchecked_text)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(fields) => Ok(Record { fields }),
            other => Err(RecordError::NotAMapping {
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = RecordError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Record::try_from(Value::from(value))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_try_from_rejects_non_mappings() {
        for value in [
            Value::Null,
            Value::Int(1),
            Value::from("x"),
            Value::Sequence(vec![]),
        ] {
            let found = value.type_name();
            assert_eq!(
                Record::try_from(value),
                Err(RecordError::NotAMapping { found })
            );
        }
        assert!(Record::try_from(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_sanitized_record() {
        let mut record = Record::try_from(json!({"id": 1})).unwrap();
        record.insert("name", Value::Utf16(vec![0x48, 0xD800, 0x69]));
        assert!(record.has_unchecked_text());

        let clean = record.sanitized();
        assert!(!clean.has_unchecked_text());
        assert_eq!(clean.get("name"), Some(&Value::from("Hi")));
        assert_eq!(clean.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(serde_json::to_string(&clean).unwrap(), r#"{"id":1,"name":"Hi"}"#);
    }
}
