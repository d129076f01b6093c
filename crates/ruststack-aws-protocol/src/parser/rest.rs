//! REST-JSON and REST-XML request parsing.
//!
//! The operation is found by method and exact URI template. Members bound to
//! an HTTP location are read from headers and the query string; everything
//! else comes from the body, either whole or through the `payload` member.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use ruststack_aws_model::{
    Location, OperationModel, Params, RawRequest, ServiceModel, ShapeType, ShapeView, Value,
};

use super::{json, text_scalar, xml};
use crate::error::{ParseError, ScalarError};
use crate::scalar::TimestampFormat;

/// Body format of a REST protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RestBody {
    Json,
    Xml,
}

pub(crate) fn parse<'m>(
    service: &'m ServiceModel,
    body: RestBody,
    request: &RawRequest,
) -> Result<(&'m OperationModel, Params), ParseError> {
    let operation = service.operation_by_http(request.method.as_str(), request.path_only())?;
    let params = match service.input_shape(operation) {
        Some(shape) => parse_input(shape, operation, body, request)?,
        None => Params::new(),
    };
    Ok((operation, params))
}

fn parse_input(
    shape: ShapeView<'_>,
    operation: &OperationModel,
    body: RestBody,
    request: &RawRequest,
) -> Result<Params, ParseError> {
    let query = QueryParams::from_request(request);
    let mut params = Params::new();

    for (name, member) in shape.members() {
        let Some(location) = member.location() else {
            continue;
        };
        let value = match location {
            Location::Header => header_value(member, name, request)?,
            Location::Headers => prefixed_headers(member, name, request),
            Location::QueryString => query.value(member, name)?,
            Location::Uri => {
                return Err(ParseError::NotImplemented(format!(
                    "uri-bound member {name} of {}",
                    operation.name()
                )));
            }
            Location::StatusCode => None,
        };
        if let Some(value) = value {
            params.insert(name.to_owned(), value);
        }
    }

    match shape.payload() {
        Some(payload) => {
            if let Some(member) = shape.member(payload) {
                if let Some(value) = payload_value(member, payload, body, request)? {
                    params.insert(payload.to_owned(), value);
                }
            }
        }
        None if !is_blank(&request.body) => {
            params.extend(decode_body(shape, body, &request.body, true)?);
        }
        None => {}
    }
    Ok(params)
}

fn payload_value(
    member: ShapeView<'_>,
    name: &str,
    body: RestBody,
    request: &RawRequest,
) -> Result<Option<Value>, ParseError> {
    if member.is_event_stream() {
        return Err(ParseError::NotImplemented(format!(
            "event stream payload {name}"
        )));
    }
    if request.body.is_empty() {
        return Ok(None);
    }
    Ok(match member.shape_type() {
        ShapeType::Blob => Some(Value::Blob(request.body.clone())),
        ShapeType::String => Some(Value::String(
            String::from_utf8_lossy(&request.body).into_owned(),
        )),
        ShapeType::Structure if is_blank(&request.body) => None,
        ShapeType::Structure => Some(Value::Map(decode_body(
            member,
            body,
            &request.body,
            false,
        )?)),
        _ => None,
    })
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn decode_body(
    shape: ShapeView<'_>,
    body: RestBody,
    bytes: &[u8],
    skip_locations: bool,
) -> Result<Params, ParseError> {
    match body {
        RestBody::Json => {
            let document = json::parse_document(bytes)?;
            Ok(json::decode_structure(shape, &document, "", skip_locations)?.unwrap_or_default())
        }
        RestBody::Xml => xml::decode_document(shape, bytes, skip_locations),
    }
}

fn header_value(
    member: ShapeView<'_>,
    name: &str,
    request: &RawRequest,
) -> Result<Option<Value>, ParseError> {
    let header = member.serialized_name(name);
    let scalar_error = |e| ParseError::scalar(header, e);

    if member.shape_type() == ShapeType::List {
        let Some(item) = member.list_member() else {
            return Ok(None);
        };
        let mut items = Vec::new();
        for raw in request.headers.get_all(header) {
            let Ok(text) = raw.to_str() else {
                continue;
            };
            for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                items.push(text_scalar(item, part, TimestampFormat::Rfc822).map_err(scalar_error)?);
            }
        }
        return Ok((!items.is_empty()).then_some(Value::List(items)));
    }

    let Some(text) = request.header(header) else {
        return Ok(None);
    };
    if member.shape_type() == ShapeType::String && member.is_json_value() {
        let decoded = BASE64_STANDARD
            .decode(text.trim())
            .map_err(|_| scalar_error(ScalarError::invalid("base64 JSON", text)))?;
        let document = serde_json::from_slice(&decoded)
            .map_err(|_| scalar_error(ScalarError::invalid("base64 JSON", text)))?;
        return Ok(Some(Value::Document(document)));
    }
    text_scalar(member, text, TimestampFormat::Rfc822)
        .map(Some)
        .map_err(scalar_error)
}

fn prefixed_headers(member: ShapeView<'_>, name: &str, request: &RawRequest) -> Option<Value> {
    let prefix = member.serialized_name(name).to_ascii_lowercase();
    let mut map = Params::new();
    for (header, value) in &request.headers {
        let Some(key) = header.as_str().strip_prefix(prefix.as_str()) else {
            continue;
        };
        if let Ok(text) = value.to_str() {
            map.insert(key.to_owned(), Value::String(text.to_owned()));
        }
    }
    (!map.is_empty()).then_some(Value::Map(map))
}

/// Query string parameters with every value of repeated keys.
struct QueryParams {
    order: Vec<String>,
    values: HashMap<String, Vec<String>>,
}

impl QueryParams {
    fn from_request(request: &RawRequest) -> Self {
        let mut order = Vec::new();
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        let pairs = form_urlencoded::parse(request.query_string().unwrap_or_default().as_bytes());
        for (key, value) in pairs {
            let key = key.into_owned();
            if !values.contains_key(&key) {
                order.push(key.clone());
            }
            values.entry(key).or_default().push(value.into_owned());
        }
        Self { order, values }
    }

    fn value(&self, member: ShapeView<'_>, name: &str) -> Result<Option<Value>, ParseError> {
        let key = member.serialized_name(name);
        match member.shape_type() {
            ShapeType::Map => {
                let Some(value_shape) = member.map_value() else {
                    return Ok(None);
                };
                let mut map = Params::new();
                for key in &self.order {
                    let values = &self.values[key];
                    let value = if value_shape.shape_type() == ShapeType::List {
                        Value::List(values.iter().cloned().map(Value::String).collect())
                    } else {
                        Value::String(values.first().cloned().unwrap_or_default())
                    };
                    map.insert(key.clone(), value);
                }
                Ok((!map.is_empty()).then_some(Value::Map(map)))
            }
            ShapeType::List => {
                let (Some(item), Some(values)) = (member.list_member(), self.values.get(key)) else {
                    return Ok(None);
                };
                values
                    .iter()
                    .map(|v| {
                        text_scalar(item, v, TimestampFormat::Iso8601)
                            .map_err(|e| ParseError::scalar(key, e))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|items| Some(Value::List(items)))
            }
            _ => match self.values.get(key).and_then(|v| v.first()) {
                Some(text) => text_scalar(member, text, TimestampFormat::Iso8601)
                    .map(Some)
                    .map_err(|e| ParseError::scalar(key, e)),
                None => Ok(None),
            },
        }
    }
}
