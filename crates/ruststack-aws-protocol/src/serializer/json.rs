//! JSON bodies for the JSON and REST-JSON protocols.

use bytes::Bytes;
use ruststack_aws_model::{OperationModel, Params, ServiceModel, ShapeType, ShapeView, Value};
use serde_json::{Map, Value as Json};

use super::{BodyCodec, ErrorDetails, SerializationContext, check_members, mismatch};
use crate::error::SerializeError;
use crate::scalar::{self, TimestampFormat};

/// Key of the single-entry object list items are written through.
const LIST_ITEM_KEY: &str = "__current__";

/// Writes JSON result and error objects.
#[derive(Debug, Clone, Copy)]
pub struct JsonBodyCodec {
    rest: bool,
}

impl JsonBodyCodec {
    /// A codec for `rest-json` when `rest` is set, `json` otherwise.
    #[must_use]
    pub fn new(rest: bool) -> Self {
        Self { rest }
    }
}

impl BodyCodec for JsonBodyCodec {
    fn content_type(&self, service: &ServiceModel) -> String {
        if self.rest {
            "application/json".to_owned()
        } else {
            let version = service.metadata().json_version.as_deref().unwrap_or("1.0");
            format!("application/x-amz-json-{version}")
        }
    }

    fn serialize_result(
        &self,
        _ctx: &SerializationContext<'_>,
        _operation: &OperationModel,
        shape: Option<ShapeView<'_>>,
        params: &Params,
    ) -> Result<Bytes, SerializeError> {
        let object = match shape {
            Some(shape) => structure(shape, params)?,
            None => Map::new(),
        };
        Ok(Bytes::from(serde_json::to_vec(&object)?))
    }

    fn serialize_error(
        &self,
        _ctx: &SerializationContext<'_>,
        error: &ErrorDetails<'_>,
    ) -> Result<Bytes, SerializeError> {
        let mut object = Map::new();
        object.insert("__type".to_owned(), Json::from(error.code.as_str()));
        object.insert("message".to_owned(), Json::from(error.message));
        if let (Some(shape), Some(fields)) = (error.shape, error.fields) {
            object.extend(structure(shape, fields)?);
        }
        Ok(Bytes::from(serde_json::to_vec(&object)?))
    }
}

fn structure(shape: ShapeView<'_>, params: &Params) -> Result<Map<String, Json>, SerializeError> {
    check_members(shape, params)?;
    let mut object = Map::new();
    for (name, member) in shape.members() {
        if member.location().is_some() {
            continue;
        }
        if let Some(value) = params.get(name) {
            write_keyed(&mut object, member.serialized_name(name), member, value)?;
        }
    }
    Ok(object)
}

fn write_keyed(
    object: &mut Map<String, Json>,
    key: &str,
    shape: ShapeView<'_>,
    value: &Value,
) -> Result<(), SerializeError> {
    let json = match (shape.shape_type(), value) {
        (_, Value::Document(document)) => document.clone(),
        (ShapeType::Structure, Value::Map(params)) => Json::Object(structure(shape, params)?),
        (ShapeType::List, Value::List(items)) => {
            let Some(item_shape) = shape.list_member() else {
                return Ok(());
            };
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                let mut wrapper = Map::new();
                write_keyed(&mut wrapper, LIST_ITEM_KEY, item_shape, item)?;
                array.extend(wrapper.remove(LIST_ITEM_KEY));
            }
            Json::Array(array)
        }
        (ShapeType::Map, Value::Map(entries)) => {
            let Some(value_shape) = shape.map_value() else {
                return Ok(());
            };
            let mut map = Map::new();
            for (entry_key, entry) in entries {
                write_keyed(&mut map, entry_key, value_shape, entry)?;
            }
            Json::Object(map)
        }
        (ShapeType::String, Value::String(s)) => Json::from(s.as_str()),
        (ShapeType::Integer | ShapeType::Long, Value::Integer(i)) => Json::from(*i),
        (ShapeType::Float | ShapeType::Double, Value::Integer(i)) => Json::from(*i),
        (ShapeType::Float | ShapeType::Double, Value::Float(f)) => {
            serde_json::Number::from_f64(*f)
                .map_or_else(|| Json::from(scalar::float_to_text(*f)), Json::Number)
        }
        (ShapeType::Boolean, Value::Boolean(b)) => Json::from(*b),
        (ShapeType::Blob, Value::Blob(b)) => Json::from(scalar::blob_to_text(b)),
        (ShapeType::Blob, Value::String(s)) => Json::from(scalar::blob_to_text(s.as_bytes())),
        (ShapeType::Timestamp, Value::Timestamp(t)) => {
            match TimestampFormat::resolve(shape.timestamp_format(), TimestampFormat::UnixTimestamp)? {
                TimestampFormat::UnixTimestamp => Json::from(t.timestamp()),
                format => Json::from(scalar::timestamp_to_text(t, format)),
            }
        }
        _ => return Err(mismatch(shape, value)),
    };
    object.insert(key.to_owned(), json);
    Ok(())
}
