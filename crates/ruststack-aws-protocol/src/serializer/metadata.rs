//! Request-id headers and HTTP-binding behavior per protocol family.

use ruststack_aws_model::RawResponse;

use super::{ErrorDetails, MetadataDecorator, SerializationContext};
use crate::error::SerializeError;

/// Query and EC2 carry the request id in the body only.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMetadata;

impl MetadataDecorator for QueryMetadata {
    fn decorate(
        &self,
        _ctx: &SerializationContext<'_>,
        _response: &mut RawResponse,
        _error: Option<&ErrorDetails<'_>>,
    ) -> Result<(), SerializeError> {
        Ok(())
    }
}

/// `x-amzn-requestid` on every JSON protocol response.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadata;

impl MetadataDecorator for JsonMetadata {
    fn decorate(
        &self,
        ctx: &SerializationContext<'_>,
        response: &mut RawResponse,
        _error: Option<&ErrorDetails<'_>>,
    ) -> Result<(), SerializeError> {
        response.insert_header("x-amzn-requestid", ctx.request_id)?;
        Ok(())
    }
}

/// REST protocols: `x-amz-request-id`, plus the JSON family's headers for
/// REST-JSON. Header and status-code members are bound to the HTTP message.
#[derive(Debug, Clone, Copy)]
pub struct RestMetadata {
    json: bool,
}

impl RestMetadata {
    /// Metadata for `rest-json` when `json` is set, `rest-xml` otherwise.
    #[must_use]
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl MetadataDecorator for RestMetadata {
    fn binds_http_locations(&self) -> bool {
        true
    }

    fn decorate(
        &self,
        ctx: &SerializationContext<'_>,
        response: &mut RawResponse,
        error: Option<&ErrorDetails<'_>>,
    ) -> Result<(), SerializeError> {
        response.insert_header("x-amz-request-id", ctx.request_id)?;
        if self.json {
            response.insert_header("x-amzn-requestid", ctx.request_id)?;
            if let Some(error) = error {
                response.insert_header("x-amzn-errortype", &error.code)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ruststack_aws_model::fixtures;

    use super::*;

    fn context(service: &ruststack_aws_model::ServiceModel) -> SerializationContext<'_> {
        SerializationContext {
            service,
            operation: None,
            request_id: "req-1",
        }
    }

    fn error() -> ErrorDetails<'static> {
        ErrorDetails {
            code: "ResourceNotFoundException".to_owned(),
            message: "missing",
            sender_fault: true,
            status: 404,
            shape: None,
            fields: None,
        }
    }

    #[test]
    fn test_should_leave_query_responses_untouched() {
        let sqs = fixtures::sqs();
        let mut response = RawResponse::default();
        QueryMetadata
            .decorate(&context(&sqs), &mut response, None)
            .unwrap();
        assert!(response.headers.is_empty());
        assert!(!QueryMetadata.binds_http_locations());
    }

    #[test]
    fn test_should_add_rest_json_headers_for_errors() {
        let lambda = fixtures::lambda();
        let mut response = RawResponse::default();
        RestMetadata::new(true)
            .decorate(&context(&lambda), &mut response, Some(&error()))
            .unwrap();
        assert_eq!(response.header("x-amz-request-id"), Some("req-1"));
        assert_eq!(response.header("x-amzn-requestid"), Some("req-1"));
        assert_eq!(
            response.header("x-amzn-errortype"),
            Some("ResourceNotFoundException")
        );
    }

    #[test]
    fn test_should_add_only_amz_request_id_for_rest_xml() {
        let s3 = fixtures::s3();
        let mut response = RawResponse::default();
        RestMetadata::new(false)
            .decorate(&context(&s3), &mut response, Some(&error()))
            .unwrap();
        assert_eq!(response.header("x-amz-request-id"), Some("req-1"));
        assert!(response.header("x-amzn-requestid").is_none());
        assert!(response.header("x-amzn-errortype").is_none());
        assert!(RestMetadata::new(false).binds_http_locations());
    }

    #[test]
    fn test_should_add_amzn_request_id_for_json() {
        let kinesis = fixtures::kinesis();
        let mut response = RawResponse::default();
        JsonMetadata
            .decorate(&context(&kinesis), &mut response, None)
            .unwrap();
        assert_eq!(response.header("x-amzn-requestid"), Some("req-1"));
    }
}
