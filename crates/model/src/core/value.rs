use indexmap::IndexMap;
use serde::{
    Serialize, Serializer,
    ser::{Error as _, SerializeMap},
};

/// Field mapping that keeps insertion order.
pub type Map = IndexMap<String, Value>;

/// Dynamically typed field value carried by a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Text received as UTF-16 code units that may still carry unpaired
    /// surrogates. Only the sanitizer turns it into `String`.
    Utf16(Vec<u16>),
    Map(Map),
    Sequence(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Utf16(_) => "utf16 text",
            Value::Map(_) => "mapping",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true when any text below this value has not been sanitized yet.
    pub fn has_unchecked_text(&self) -> bool {
        match self {
            Value::Utf16(_) => true,
            Value::Map(map) => map.values().any(Value::has_unchecked_text),
            Value::Sequence(items) => items.iter().any(Value::has_unchecked_text),
            _ => false,
        }
    }

    /// Approximate encoded size, used for byte-size batch limits.
    pub fn size_bytes(&self) -> usize {
        match self {
            Value::Null => 4,
            Value::Boolean(_) => 5,
            Value::Int(_) | Value::Float(_) => std::mem::size_of::<i64>(),
            Value::String(s) => s.len() + 2,
            Value::Utf16(units) => units.len() * 2 + 2,
            Value::Map(map) => map.iter().map(|(k, v)| k.len() + 3 + v.size_bytes()).sum::<usize>() + 2,
            Value::Sequence(items) => items.iter().map(|v| v.size_bytes() + 1).sum::<usize>() + 2,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Utf16(_) => Err(S::Error::custom(
                "text contains unsanitized UTF-16 code units",
            )),
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Sequence(items) => serializer.collect_seq(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = Value::from(json!({"z": 1, "a": {"y": true, "b": null}, "m": [1.5, "x"]}));
        let map = value.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let nested = map["a"].as_map().unwrap();
        let nested_keys: Vec<&str> = nested.keys().map(String::as_str).collect();
        assert_eq!(nested_keys, vec!["y", "b"]);
        assert_eq!(
            map["m"],
            Value::Sequence(vec![Value::Float(1.5), Value::from("x")])
        );
    }

    #[test]
    fn test_serialize_rejects_unchecked_text() {
        let value = Value::Sequence(vec![Value::Utf16(vec![0x61])]);
        assert!(value.has_unchecked_text());
        assert!(serde_json::to_string(&value).is_err());
    }

    #[test]
    fn test_serialize_scalars() {
        let value = Value::from(json!({"i": -3, "f": 0.25, "b": false, "n": null, "s": "q\""}));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"i":-3,"f":0.25,"b":false,"n":null,"s":"q\""}"#
        );
    }
}
