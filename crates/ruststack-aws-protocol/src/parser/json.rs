//! JSON request parsing, for the `json` protocol and for REST-JSON bodies.

use ruststack_aws_model::{
    ModelError, OperationModel, Params, RawRequest, ServiceModel, ShapeType, ShapeView, Value,
};
use serde_json::Value as Json;

use super::{join_key, text_scalar};
use crate::error::{ParseError, ScalarError};
use crate::scalar::{self, TimestampFormat};

pub(crate) fn parse<'m>(
    service: &'m ServiceModel,
    request: &RawRequest,
) -> Result<(&'m OperationModel, Params), ParseError> {
    let target = request
        .header("x-amz-target")
        .ok_or_else(|| ParseError::MissingAction("request has no X-Amz-Target header".to_owned()))?;
    let (prefix, name) = target
        .rsplit_once('.')
        .ok_or_else(|| ParseError::MissingAction(format!("malformed X-Amz-Target {target}")))?;
    if let Some(expected) = service.metadata().target_prefix.as_deref() {
        if prefix != expected {
            return Err(ModelError::UnknownOperation(target.to_owned()).into());
        }
    }
    let operation = service.operation_by_name(name)?;

    let params = match service.input_shape(operation) {
        Some(shape) => {
            let document = parse_document(&request.body)?;
            decode_structure(shape, &document, "", false)?.unwrap_or_default()
        }
        None => Params::new(),
    };
    Ok((operation, params))
}

/// Parse a JSON body; an empty body is an empty object.
pub(crate) fn parse_document(body: &[u8]) -> Result<Json, ParseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Json::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ParseError::MalformedRequestBody(e.to_string()))
}

/// Read a structure from a JSON object. `null` is absent; members bound to an
/// HTTP location are skipped when `skip_locations` is set.
pub(crate) fn decode_structure(
    shape: ShapeView<'_>,
    json: &Json,
    path: &str,
    skip_locations: bool,
) -> Result<Option<Params>, ParseError> {
    let object = match json {
        Json::Null => return Ok(None),
        Json::Object(object) => object,
        other => return Err(mismatch(path, "object", other)),
    };

    let mut params = Params::new();
    for (name, member) in shape.members() {
        if let Some(location) = member.location() {
            if skip_locations {
                continue;
            }
            return Err(ParseError::NotImplemented(format!(
                "{location} binding of {name} in a JSON body"
            )));
        }
        let wire = member.serialized_name(name);
        let Some(raw) = object.get(wire) else {
            continue;
        };
        if let Some(value) = decode_value(member, raw, &join_key(path, wire))? {
            params.insert(name.to_owned(), value);
        }
    }
    Ok(Some(params))
}

fn decode_value(shape: ShapeView<'_>, json: &Json, path: &str) -> Result<Option<Value>, ParseError> {
    if json.is_null() {
        return Ok(None);
    }
    if shape.is_document() {
        return Ok(Some(Value::Document(json.clone())));
    }

    let value = match shape.shape_type() {
        ShapeType::Structure => return Ok(decode_structure(shape, json, path, false)?.map(Value::Map)),
        ShapeType::List => {
            let Json::Array(items) = json else {
                return Err(mismatch(path, "array", json));
            };
            let Some(member) = shape.list_member() else {
                return Ok(None);
            };
            let mut values = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                if let Some(value) = decode_value(member, item, &format!("{path}[{index}]"))? {
                    values.push(value);
                }
            }
            Value::List(values)
        }
        ShapeType::Map => {
            let Json::Object(entries) = json else {
                return Err(mismatch(path, "object", json));
            };
            let Some(value_shape) = shape.map_value() else {
                return Ok(None);
            };
            let mut values = Params::new();
            for (key, item) in entries {
                if let Some(value) = decode_value(value_shape, item, &join_key(path, key))? {
                    values.insert(key.clone(), value);
                }
            }
            Value::Map(values)
        }
        ShapeType::String => match json {
            Json::String(s) => Value::String(s.clone()),
            other => return Err(mismatch(path, "string", other)),
        },
        ShapeType::Integer | ShapeType::Long => match json.as_i64() {
            Some(i) => Value::Integer(i),
            None => return Err(mismatch(path, "integer", json)),
        },
        ShapeType::Float | ShapeType::Double => match json {
            Json::Number(n) => Value::Float(n.as_f64().unwrap_or_default()),
            Json::String(s) => {
                Value::Float(scalar::text_to_float(s).map_err(|e| ParseError::scalar(path, e))?)
            }
            other => return Err(mismatch(path, "float", other)),
        },
        ShapeType::Boolean => match json {
            Json::Bool(b) => Value::Boolean(*b),
            other => return Err(mismatch(path, "boolean", other)),
        },
        ShapeType::Blob => match json {
            Json::String(s) => {
                Value::Blob(scalar::text_to_blob(s).map_err(|e| ParseError::scalar(path, e))?)
            }
            other => return Err(mismatch(path, "base64 string", other)),
        },
        ShapeType::Timestamp => match json {
            Json::Number(n) => n
                .as_f64()
                .and_then(scalar::epoch_to_timestamp)
                .map(Value::Timestamp)
                .ok_or_else(|| mismatch(path, "timestamp", json))?,
            Json::String(s) => match s.parse::<f64>().ok().and_then(scalar::epoch_to_timestamp) {
                Some(timestamp) => Value::Timestamp(timestamp),
                None => text_scalar(shape, s, TimestampFormat::Iso8601)
                    .map_err(|e| ParseError::scalar(path, e))?,
            },
            other => return Err(mismatch(path, "timestamp", other)),
        },
    };
    Ok(Some(value))
}

fn mismatch(path: &str, expected: &'static str, found: &Json) -> ParseError {
    ParseError::scalar(path, ScalarError::invalid(expected, found.to_string()))
}
