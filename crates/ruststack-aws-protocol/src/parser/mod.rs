//! Request parsers.
//!
//! A [`RequestParser`] is built once per service and turns every incoming
//! [`RawRequest`] into the resolved operation and a [`Params`] tree keyed by
//! member names. The protocol is picked once, at construction, from the
//! model's `metadata.protocol`.

mod json;
mod query;
mod rest;
mod xml;

use std::sync::Arc;

use ruststack_aws_model::{
    OperationModel, Params, Protocol, RawRequest, ServiceModel, ShapeType, ShapeView, Value,
};
use ruststack_core::RustStackConfig;

use crate::error::{ParseError, ScalarError};
use crate::scalar::{self, TimestampFormat};

use self::query::QueryFlavor;
use self::rest::RestBody;

/// Default bound on Query list and map enumeration.
pub const DEFAULT_MAX_LIST_ENTRIES: usize = 1000;

/// Tunables of the request parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Largest index a Query or EC2 list or map may reach.
    pub max_list_entries: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_list_entries: DEFAULT_MAX_LIST_ENTRIES,
        }
    }
}

impl From<&RustStackConfig> for ParserConfig {
    fn from(config: &RustStackConfig) -> Self {
        Self {
            max_list_entries: config.query_max_entries,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Dialect {
    Query(QueryFlavor),
    Json,
    Rest(RestBody),
}

impl From<Protocol> for Dialect {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Query => Self::Query(QueryFlavor::Query),
            Protocol::Ec2 => Self::Query(QueryFlavor::Ec2),
            Protocol::Json => Self::Json,
            Protocol::RestJson => Self::Rest(RestBody::Json),
            Protocol::RestXml => Self::Rest(RestBody::Xml),
        }
    }
}

/// Parses raw requests of one service.
#[derive(Debug, Clone)]
pub struct RequestParser {
    service: Arc<ServiceModel>,
    dialect: Dialect,
    config: ParserConfig,
}

impl RequestParser {
    /// A parser with default limits.
    #[must_use]
    pub fn new(service: Arc<ServiceModel>) -> Self {
        Self::with_config(service, ParserConfig::default())
    }

    /// A parser with explicit limits.
    #[must_use]
    pub fn with_config(service: Arc<ServiceModel>, config: ParserConfig) -> Self {
        let dialect = Dialect::from(service.protocol());
        Self {
            service,
            dialect,
            config,
        }
    }

    /// The service this parser reads requests for.
    #[must_use]
    pub fn service(&self) -> &Arc<ServiceModel> {
        &self.service
    }

    /// Resolve the operation a request invokes and parse its input.
    ///
    /// Members missing from the wire are absent from the returned tree;
    /// an operation without an input shape yields an empty tree.
    pub fn parse(&self, request: &RawRequest) -> Result<(&OperationModel, Params), ParseError> {
        let (operation, params) = match self.dialect {
            Dialect::Query(flavor) => {
                query::parse(&self.service, flavor, self.config.max_list_entries, request)?
            }
            Dialect::Json => json::parse(&self.service, request)?,
            Dialect::Rest(body) => rest::parse(&self.service, body, request)?,
        };
        tracing::debug!(
            service = %self.service.service_name(),
            operation = %operation.name(),
            members = params.len(),
            "parsed request"
        );
        Ok((operation, params))
    }
}

/// Join a wire prefix and a member name with `.`.
fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Convert the text of a scalar member to its shape's type.
fn text_scalar(
    shape: ShapeView<'_>,
    text: &str,
    default_timestamp: TimestampFormat,
) -> Result<Value, ScalarError> {
    Ok(match shape.shape_type() {
        ShapeType::String => Value::String(text.to_owned()),
        ShapeType::Integer | ShapeType::Long => Value::Integer(scalar::text_to_int(text)?),
        ShapeType::Float | ShapeType::Double => Value::Float(scalar::text_to_float(text)?),
        ShapeType::Boolean => Value::Boolean(scalar::text_to_bool(text)?),
        ShapeType::Blob => Value::Blob(scalar::text_to_blob(text)?),
        ShapeType::Timestamp => {
            let format = TimestampFormat::resolve(shape.timestamp_format(), default_timestamp)?;
            Value::Timestamp(scalar::text_to_timestamp(text, format)?)
        }
        other @ (ShapeType::Structure | ShapeType::List | ShapeType::Map) => {
            return Err(ScalarError::invalid(other.as_str(), text));
        }
    })
}
