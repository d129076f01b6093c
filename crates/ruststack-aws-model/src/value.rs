//! The parameter tree exchanged between the codec layer and handlers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Structure members (or map entries) keyed by member name, in wire order.
pub type Params = IndexMap<String, Value>;

/// A node of a parsed request or of a handler's response.
///
/// Structures and maps are both [`Value::Map`]; the shape decides how a map
/// is read. Keys of structures are member names, never wire names.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text.
    String(String),
    /// Integer and long shapes.
    Integer(i64),
    /// Float and double shapes.
    Float(f64),
    /// Boolean shapes.
    Boolean(bool),
    /// Blob shapes, already decoded from base64.
    Blob(Bytes),
    /// Timestamp shapes.
    Timestamp(DateTime<Utc>),
    /// List shapes, in wire order.
    List(Vec<Value>),
    /// Structure and map shapes.
    Map(Params),
    /// Untyped document shapes, kept as JSON.
    Document(serde_json::Value),
}

impl Value {
    /// Build a map value from key/value pairs.
    ///
    /// ```
    /// use ruststack_aws_model::Value;
    ///
    /// let value = Value::map([("QueueUrl", Value::from("http://q")), ("DelaySeconds", Value::from(2))]);
    /// assert_eq!(value.as_map().unwrap()["DelaySeconds"], Value::Integer(2));
    /// ```
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value.
    pub fn list<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Blob(_) => "blob",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Document(_) => "document",
        }
    }

    /// The text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// An integer value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// A float value; integers widen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// A boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Bytes of a blob, or of a string's UTF-8 encoding.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// A timestamp value.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Items of a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map or structure value.
    #[must_use]
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consume into map entries.
    #[must_use]
    pub fn into_map(self) -> Option<Params> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Plain JSON rendering: blobs as base64, timestamps as epoch seconds.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::String(s) => Json::String(s.clone()),
            Self::Integer(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Boolean(b) => Json::Bool(*b),
            Self::Blob(b) => Json::String(BASE64_STANDARD.encode(b)),
            Self::Timestamp(t) => Json::from(t.timestamp()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Document(doc) => doc.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Blob(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(Bytes::from(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Params> for Value {
    fn from(value: Params) -> Self {
        Self::Map(value)
    }
}

impl From<serde_json::Value> for Value {
    /// Convert untyped JSON; `null` becomes a `null` document.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::String(s) => Self::String(s),
            Json::Bool(b) => Self::Boolean(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Document(Json::Number(n))),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
            Json::Null => Self::Document(Json::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compare_maps_regardless_of_order() {
        let a = Value::map([("A", 1), ("B", 2)]);
        let b = Value::map([("B", 2), ("A", 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_should_convert_from_untyped_json() {
        let value = Value::from(serde_json::json!({
            "Name": "queue",
            "Count": 3,
            "Ratio": 0.5,
            "Tags": ["a", "b"],
        }));
        let map = value.as_map().unwrap();
        assert_eq!(map["Name"].as_str(), Some("queue"));
        assert_eq!(map["Count"].as_i64(), Some(3));
        assert_eq!(map["Ratio"].as_f64(), Some(0.5));
        assert_eq!(map["Tags"].as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_should_render_plain_json() {
        let value = Value::map([
            ("Data", Value::from(b"hi".to_vec())),
            (
                "At",
                Value::from(DateTime::from_timestamp(1_600_000_000, 0).unwrap()),
            ),
        ]);
        assert_eq!(
            value.to_json(),
            serde_json::json!({"Data": "aGk=", "At": 1_600_000_000})
        );
    }

    #[test]
    fn test_should_expose_string_bytes() {
        assert_eq!(Value::from("abc").as_bytes(), Some(&b"abc"[..]));
        assert_eq!(Value::from(1).as_bytes(), None);
    }
}
