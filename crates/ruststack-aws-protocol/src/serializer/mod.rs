//! Response serializers.
//!
//! A [`ResponseSerializer`] is assembled once per service from two parts: a
//! [`BodyCodec`] that writes results and errors as XML or JSON, and a
//! [`MetadataDecorator`] that adds the protocol's request-id headers and, for
//! REST protocols, moves header and status-code members out of the body.

mod json;
mod metadata;
mod xml;

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use http::StatusCode;
use md5::{Digest, Md5};
use ruststack_aws_model::{
    CommonServiceException, Location, OperationModel, Params, Protocol, RawResponse,
    ServiceException, ServiceModel, ShapeType, ShapeView, Value,
};
use ruststack_core::{AmznRequestIdGenerator, RequestIdGenerator};

pub use self::json::JsonBodyCodec;
pub use self::metadata::{JsonMetadata, QueryMetadata, RestMetadata};
pub use self::xml::{XmlBodyCodec, XmlEnvelope};
use crate::error::SerializeError;
use crate::scalar::{self, TimestampFormat};

/// What a codec needs to know about the response being written.
#[derive(Debug, Clone, Copy)]
pub struct SerializationContext<'a> {
    /// Service being answered.
    pub service: &'a ServiceModel,
    /// Operation being answered; `None` for errors raised before routing.
    pub operation: Option<&'a OperationModel>,
    /// Request id of this response.
    pub request_id: &'a str,
}

/// An exception resolved to its wire metadata.
#[derive(Debug, Clone)]
pub struct ErrorDetails<'a> {
    /// Wire error code.
    pub code: String,
    /// Human readable message.
    pub message: &'a str,
    /// Whether the caller is at fault.
    pub sender_fault: bool,
    /// HTTP status.
    pub status: u16,
    /// Error shape of a modeled exception.
    pub shape: Option<ShapeView<'a>>,
    /// Extra members of a modeled exception.
    pub fields: Option<&'a Params>,
}

/// Writes result and error bodies in one document format.
pub trait BodyCodec: fmt::Debug + Send + Sync {
    /// `Content-Type` of bodies this codec writes.
    fn content_type(&self, service: &ServiceModel) -> String;

    /// Write an operation result. `shape` is the output shape, or the payload
    /// member for REST payload structures. An empty body means "no body".
    fn serialize_result(
        &self,
        ctx: &SerializationContext<'_>,
        operation: &OperationModel,
        shape: Option<ShapeView<'_>>,
        params: &Params,
    ) -> Result<Bytes, SerializeError>;

    /// Write an error envelope.
    fn serialize_error(
        &self,
        ctx: &SerializationContext<'_>,
        error: &ErrorDetails<'_>,
    ) -> Result<Bytes, SerializeError>;
}

/// Adds protocol metadata outside the body.
pub trait MetadataDecorator: fmt::Debug + Send + Sync {
    /// Whether `header`, `headers` and `statusCode` members live in the HTTP
    /// message rather than in the body.
    fn binds_http_locations(&self) -> bool {
        false
    }

    /// Add headers to a finished response. `error` is set for error responses.
    fn decorate(
        &self,
        ctx: &SerializationContext<'_>,
        response: &mut RawResponse,
        error: Option<&ErrorDetails<'_>>,
    ) -> Result<(), SerializeError>;
}

/// Serializes results and exceptions of one service.
#[derive(Debug, Clone)]
pub struct ResponseSerializer {
    service: Arc<ServiceModel>,
    request_ids: Arc<dyn RequestIdGenerator>,
    body: Arc<dyn BodyCodec>,
    metadata: Arc<dyn MetadataDecorator>,
}

impl ResponseSerializer {
    /// A serializer for the service's protocol with AWS-style request ids.
    #[must_use]
    pub fn new(service: Arc<ServiceModel>) -> Self {
        Self::with_request_ids(service, Arc::new(AmznRequestIdGenerator))
    }

    /// A serializer drawing request ids from `request_ids`.
    #[must_use]
    pub fn with_request_ids(
        service: Arc<ServiceModel>,
        request_ids: Arc<dyn RequestIdGenerator>,
    ) -> Self {
        let (body, metadata): (Arc<dyn BodyCodec>, Arc<dyn MetadataDecorator>) =
            match service.protocol() {
                Protocol::Query => (
                    Arc::new(XmlBodyCodec::new(XmlEnvelope::Query)),
                    Arc::new(QueryMetadata),
                ),
                Protocol::Ec2 => (
                    Arc::new(XmlBodyCodec::new(XmlEnvelope::Ec2)),
                    Arc::new(QueryMetadata),
                ),
                Protocol::Json => (Arc::new(JsonBodyCodec::new(false)), Arc::new(JsonMetadata)),
                Protocol::RestJson => (
                    Arc::new(JsonBodyCodec::new(true)),
                    Arc::new(RestMetadata::new(true)),
                ),
                Protocol::RestXml => (
                    Arc::new(XmlBodyCodec::new(XmlEnvelope::Bare)),
                    Arc::new(RestMetadata::new(false)),
                ),
            };
        Self {
            service,
            request_ids,
            body,
            metadata,
        }
    }

    /// The service this serializer writes responses for.
    #[must_use]
    pub fn service(&self) -> &Arc<ServiceModel> {
        &self.service
    }

    /// Serialize a handler result.
    pub fn serialize_to_response(
        &self,
        params: &Params,
        operation: &OperationModel,
    ) -> Result<RawResponse, SerializeError> {
        let request_id = self.request_ids.generate();
        let ctx = SerializationContext {
            service: &self.service,
            operation: Some(operation),
            request_id: &request_id,
        };
        let mut response = RawResponse::new(status(operation.http().default_status())?);
        let shape = self.service.output_shape(operation);

        let (body, content_type) = match shape {
            Some(shape) if self.metadata.binds_http_locations() => {
                place_http_members(shape, params, &mut response)?;
                self.rest_body(&ctx, operation, shape, params)?
            }
            _ => (
                self.body.serialize_result(&ctx, operation, shape, params)?,
                None,
            ),
        };
        self.finish(&ctx, &mut response, body, content_type, None)?;

        if operation.checksum_required() {
            let digest = BASE64_STANDARD.encode(Md5::digest(&response.body));
            response.insert_header("content-md5", &digest)?;
        }
        tracing::debug!(
            service = %self.service.service_name(),
            operation = %operation.name(),
            status = response.status.as_u16(),
            "serialized response"
        );
        Ok(response)
    }

    /// Serialize an exception raised while handling `operation`.
    pub fn serialize_error_to_response(
        &self,
        error: &ServiceException,
        operation: &OperationModel,
    ) -> Result<RawResponse, SerializeError> {
        let details = match error {
            ServiceException::Modeled(modeled) => {
                let shape = self
                    .service
                    .error_shape(operation, &modeled.name)
                    .ok_or_else(|| SerializeError::UnknownErrorShape {
                        operation: operation.name().to_owned(),
                        name: modeled.name.clone(),
                    })?;
                let metadata = shape.error();
                ErrorDetails {
                    code: metadata
                        .and_then(|m| m.code.clone())
                        .unwrap_or_else(|| shape.name().to_owned()),
                    message: &modeled.message,
                    sender_fault: metadata.is_some_and(|m| m.sender_fault),
                    status: metadata.and_then(|m| m.http_status_code).unwrap_or(400),
                    shape: Some(shape),
                    fields: Some(&modeled.fields),
                }
            }
            ServiceException::Common(common) => common_details(common),
        };
        self.serialize_error_details(Some(operation), &details)
    }

    /// Serialize a common exception that is not tied to a resolved operation,
    /// such as a request that could not be parsed.
    pub fn serialize_unbound_error(
        &self,
        error: &CommonServiceException,
    ) -> Result<RawResponse, SerializeError> {
        self.serialize_error_details(None, &common_details(error))
    }

    fn serialize_error_details(
        &self,
        operation: Option<&OperationModel>,
        details: &ErrorDetails<'_>,
    ) -> Result<RawResponse, SerializeError> {
        let request_id = self.request_ids.generate();
        let ctx = SerializationContext {
            service: &self.service,
            operation,
            request_id: &request_id,
        };
        let mut response = RawResponse::new(status(details.status)?);
        if self.metadata.binds_http_locations() {
            if let (Some(shape), Some(fields)) = (details.shape, details.fields) {
                place_http_members(shape, fields, &mut response)?;
            }
        }
        let body = self.body.serialize_error(&ctx, details)?;
        self.finish(&ctx, &mut response, body, None, Some(details))?;
        tracing::debug!(
            service = %self.service.service_name(),
            code = %details.code,
            status = details.status,
            "serialized error response"
        );
        Ok(response)
    }

    fn rest_body(
        &self,
        ctx: &SerializationContext<'_>,
        operation: &OperationModel,
        shape: ShapeView<'_>,
        params: &Params,
    ) -> Result<(Bytes, Option<&'static str>), SerializeError> {
        let Some(payload) = shape.payload() else {
            return Ok((
                self.body.serialize_result(ctx, operation, Some(shape), params)?,
                None,
            ));
        };
        let (Some(member), Some(value)) = (shape.member(payload), params.get(payload)) else {
            return Ok((Bytes::new(), None));
        };
        match (member.shape_type(), value) {
            (ShapeType::Blob, Value::Blob(bytes)) => {
                Ok((bytes.clone(), Some("application/octet-stream")))
            }
            (ShapeType::Blob | ShapeType::String, Value::String(text)) => {
                Ok((Bytes::from(text.clone()), Some("text/plain")))
            }
            (ShapeType::Structure, Value::Map(map)) => Ok((
                self.body
                    .serialize_result(ctx, operation, Some(member), map)?,
                None,
            )),
            (expected, value) => Err(SerializeError::TypeMismatch {
                shape: member.name().to_owned(),
                expected,
                actual: value.kind(),
            }),
        }
    }

    fn finish(
        &self,
        ctx: &SerializationContext<'_>,
        response: &mut RawResponse,
        body: Bytes,
        content_type: Option<&str>,
        error: Option<&ErrorDetails<'_>>,
    ) -> Result<(), SerializeError> {
        if !body.is_empty() {
            let content_type = content_type
                .map_or_else(|| self.body.content_type(&self.service), str::to_owned);
            response.insert_header("content-type", &content_type)?;
        }
        response.body = body;
        self.metadata.decorate(ctx, response, error)
    }
}

fn common_details(error: &CommonServiceException) -> ErrorDetails<'_> {
    ErrorDetails {
        code: error.code.clone(),
        message: &error.message,
        sender_fault: error.sender_fault,
        status: error.status_code,
        shape: None,
        fields: None,
    }
}

fn status(code: u16) -> Result<StatusCode, SerializeError> {
    StatusCode::from_u16(code).map_err(|_| SerializeError::InvalidStatus(i64::from(code)))
}

/// Move `header`, `headers` and `statusCode` members into the response.
fn place_http_members(
    shape: ShapeView<'_>,
    params: &Params,
    response: &mut RawResponse,
) -> Result<(), SerializeError> {
    for (name, member) in shape.members() {
        let (Some(location), Some(value)) = (member.location(), params.get(name)) else {
            continue;
        };
        match location {
            Location::Header => {
                let text = header_text(member, value)?;
                response.insert_header(member.serialized_name(name), &text)?;
            }
            Location::Headers => {
                let map = value.as_map().ok_or_else(|| mismatch(member, value))?;
                let Some(value_shape) = member.map_value() else {
                    continue;
                };
                let prefix = member.serialized_name(name);
                for (key, item) in map {
                    let text = scalar_text(value_shape, item, TimestampFormat::Rfc822)?;
                    response.insert_header(&format!("{prefix}{key}"), &text)?;
                }
            }
            Location::StatusCode => {
                let code = value.as_i64().ok_or_else(|| mismatch(member, value))?;
                response.status = u16::try_from(code)
                    .ok()
                    .and_then(|c| StatusCode::from_u16(c).ok())
                    .ok_or(SerializeError::InvalidStatus(code))?;
            }
            Location::QueryString | Location::Uri => {}
        }
    }
    Ok(())
}

fn header_text(member: ShapeView<'_>, value: &Value) -> Result<String, SerializeError> {
    match (member.shape_type(), value) {
        (ShapeType::List, Value::List(items)) => {
            let Some(item_shape) = member.list_member() else {
                return Ok(String::new());
            };
            let parts = items
                .iter()
                .map(|item| scalar_text(item_shape, item, TimestampFormat::Rfc822))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(","))
        }
        (ShapeType::String, Value::Document(document)) if member.is_json_value() => {
            Ok(BASE64_STANDARD.encode(serde_json::to_vec(document)?))
        }
        _ => scalar_text(member, value, TimestampFormat::Rfc822),
    }
}

/// Render a scalar value as text for XML bodies and headers.
fn scalar_text(
    shape: ShapeView<'_>,
    value: &Value,
    default_timestamp: TimestampFormat,
) -> Result<String, SerializeError> {
    Ok(match (shape.shape_type(), value) {
        (ShapeType::String, Value::String(s)) => s.clone(),
        (ShapeType::Integer | ShapeType::Long, Value::Integer(i)) => i.to_string(),
        (ShapeType::Float | ShapeType::Double, Value::Float(f)) => scalar::float_to_text(*f),
        (ShapeType::Float | ShapeType::Double, Value::Integer(i)) => i.to_string(),
        (ShapeType::Boolean, Value::Boolean(b)) => scalar::bool_to_text(*b).to_owned(),
        (ShapeType::Blob, Value::Blob(b)) => scalar::blob_to_text(b),
        (ShapeType::Blob, Value::String(s)) => scalar::blob_to_text(s.as_bytes()),
        (ShapeType::Timestamp, Value::Timestamp(t)) => {
            let format = TimestampFormat::resolve(shape.timestamp_format(), default_timestamp)?;
            scalar::timestamp_to_text(t, format)
        }
        _ => return Err(mismatch(shape, value)),
    })
}

fn mismatch(shape: ShapeView<'_>, value: &Value) -> SerializeError {
    SerializeError::TypeMismatch {
        shape: shape.name().to_owned(),
        expected: shape.shape_type(),
        actual: value.kind(),
    }
}

/// Fail on value keys the structure does not declare.
fn check_members(shape: ShapeView<'_>, params: &Params) -> Result<(), SerializeError> {
    match params.keys().find(|key| !shape.has_member(key)) {
        Some(member) => Err(SerializeError::UnknownMember {
            shape: shape.name().to_owned(),
            member: member.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ruststack_aws_model::{ModeledException, fixtures};

    use super::*;
    use crate::xml::XmlElement;

    #[derive(Debug)]
    struct FixedIds;

    impl RequestIdGenerator for FixedIds {
        fn generate(&self) -> String {
            "REQ".repeat(17) + "X"
        }
    }

    fn serializer(service: Arc<ServiceModel>) -> ResponseSerializer {
        ResponseSerializer::with_request_ids(service, Arc::new(FixedIds))
    }

    #[test]
    fn test_should_place_rest_headers_status_and_blob_payload() {
        let lambda = fixtures::lambda();
        let operation = lambda.operation_by_name("Invoke").unwrap();
        let params = Params::from_iter([
            ("StatusCode".to_owned(), Value::from(202)),
            ("FunctionError".to_owned(), Value::from("Unhandled")),
            ("ExecutedVersion".to_owned(), Value::from("$LATEST")),
            ("Payload".to_owned(), Value::from(b"{\"ok\":true}".to_vec())),
        ]);

        let response = serializer(lambda.clone())
            .serialize_to_response(&params, operation)
            .unwrap();
        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert_eq!(response.header("X-Amz-Function-Error"), Some("Unhandled"));
        assert_eq!(response.header("x-amz-executed-version"), Some("$LATEST"));
        assert_eq!(response.header("content-type"), Some("application/octet-stream"));
        assert_eq!(response.body, Bytes::from_static(b"{\"ok\":true}"));
        assert!(response.header("x-amzn-requestid").is_some());
        assert!(response.header("x-amz-request-id").is_some());
    }

    #[test]
    fn test_should_use_declared_response_code() {
        let route53 = fixtures::route53();
        let operation = route53.operation_by_name("CreateHostedZone").unwrap();
        let params = Params::from_iter([
            ("Location".to_owned(), Value::from("https://route53/hostedzone/Z1")),
            (
                "HostedZone".to_owned(),
                Value::map([("Id", "Z1"), ("Name", "example.com.")]),
            ),
        ]);

        let response = serializer(route53.clone())
            .serialize_to_response(&params, operation)
            .unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(
            response.header("location"),
            Some("https://route53/hostedzone/Z1")
        );
        let root = XmlElement::parse(&response.body).unwrap();
        assert_eq!(root.name, "CreateHostedZoneResponse");
        assert!(root.child("Location").is_none());
        assert_eq!(
            root.child("HostedZone").unwrap().child("Id").unwrap().text,
            "Z1"
        );
    }

    #[test]
    fn test_should_add_content_md5_when_checksum_required() {
        let s3 = fixtures::s3();
        let operation = s3.operation_by_name("PutBucketTagging").unwrap();
        let response = serializer(s3.clone())
            .serialize_to_response(&Params::new(), operation)
            .unwrap();
        assert!(response.body.is_empty());
        assert_eq!(response.header("content-md5"), Some("1B2M2Y8AsgTpgAmY7PhCfg=="));
    }

    #[test]
    fn test_should_default_modeled_error_status_to_400() {
        let kinesis = fixtures::kinesis();
        let operation = kinesis.operation_by_name("PutRecord").unwrap();
        let error = ServiceException::modeled("ResourceNotFoundException", "no stream");

        let response = serializer(kinesis.clone())
            .serialize_error_to_response(&error, operation)
            .unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["__type"], "ResourceNotFoundException");
        assert_eq!(body["message"], "no stream");
    }

    #[test]
    fn test_should_use_declared_status_and_place_error_headers() {
        let lambda = fixtures::lambda();
        let operation = lambda.operation_by_name("CreateFunction").unwrap();
        let error = ServiceException::Modeled(
            ModeledException::new("TooManyRequestsException", "slow down")
                .with_field("retryAfterSeconds", "30")
                .with_field("Reason", "CallerRateLimitExceeded"),
        );

        let response = serializer(lambda.clone())
            .serialize_error_to_response(&error, operation)
            .unwrap();
        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.header("retry-after"), Some("30"));
        assert_eq!(
            response.header("x-amzn-errortype"),
            Some("TooManyRequestsException")
        );
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["__type"], "TooManyRequestsException");
        assert_eq!(body["message"], "slow down");
        assert_eq!(body["Reason"], "CallerRateLimitExceeded");
        assert!(body.get("retryAfterSeconds").is_none());
    }

    #[test]
    fn test_should_fail_on_undeclared_modeled_error() {
        let sqs = fixtures::sqs();
        let operation = sqs.operation_by_name("ListQueues").unwrap();
        let error = ServiceException::modeled("QueueDoesNotExist", "gone");
        assert!(matches!(
            serializer(sqs.clone()).serialize_error_to_response(&error, operation),
            Err(SerializeError::UnknownErrorShape { name, .. }) if name == "QueueDoesNotExist"
        ));
    }

    #[test]
    fn test_should_serialize_common_error_without_operation() {
        let kinesis = fixtures::kinesis();
        let error = CommonServiceException::new("SerializationException", "bad body");

        let response = serializer(kinesis.clone())
            .serialize_unbound_error(&error)
            .unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.header("content-type"),
            Some("application/x-amz-json-1.1")
        );
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["__type"], "SerializationException");
    }

    #[test]
    fn test_should_format_header_values() {
        let s3 = fixtures::s3();
        let input = s3.shape_by_name("WriteGetObjectResponseRequest").unwrap();
        let modified = input.member("LastModified").unwrap();
        let value = Value::Timestamp(chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(
            header_text(modified, &value).unwrap(),
            "Tue, 02 Jan 2024 03:04:05 GMT"
        );
        assert!(matches!(
            header_text(modified, &Value::from(5)),
            Err(SerializeError::TypeMismatch { actual: "integer", .. })
        ));
    }

    #[test]
    fn test_should_reject_out_of_range_status_member() {
        let lambda = fixtures::lambda();
        let operation = lambda.operation_by_name("Invoke").unwrap();
        let params = Params::from_iter([("StatusCode".to_owned(), Value::from(70_000))]);
        assert!(matches!(
            serializer(lambda.clone()).serialize_to_response(&params, operation),
            Err(SerializeError::InvalidStatus(70_000))
        ));
    }
}
