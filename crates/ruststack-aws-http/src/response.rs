//! Error mapping and conversion of serialized responses to HTTP.

use http::HeaderValue;
use ruststack_aws_model::{CommonServiceException, ModelError, Protocol, RawResponse};
use ruststack_aws_protocol::ParseError;

use crate::body::AwsResponseBody;

/// Map a request that failed to parse to the common exception the
/// protocol's clients expect.
///
/// | Failure                              | Code                                       | Status |
/// |--------------------------------------|--------------------------------------------|--------|
/// | missing or unknown action / target   | `InvalidAction` or `UnknownOperationException` | 400 |
/// | no operation bound to method + path  | `UnknownOperationException`                | 404    |
/// | malformed body or member value       | `MalformedQueryString`, `SerializationException`, `MalformedInput` | 400 |
/// | too many list or map entries         | `InvalidParameterValue`                    | 400    |
/// | unsupported binding                  | `InternalFailure`                          | 501    |
#[must_use]
pub fn parse_failure(protocol: Protocol, error: &ParseError) -> CommonServiceException {
    let message = error.to_string();
    let form_encoded = matches!(protocol, Protocol::Query | Protocol::Ec2);
    match error {
        ParseError::MissingAction(_) | ParseError::Model(ModelError::UnknownOperation(_)) => {
            let code = if form_encoded {
                "InvalidAction"
            } else {
                "UnknownOperationException"
            };
            CommonServiceException::new(code, message).with_sender_fault(true)
        }
        ParseError::Model(ModelError::NoMatchingOperation { .. }) => {
            CommonServiceException::new("UnknownOperationException", message)
                .with_status(404)
                .with_sender_fault(true)
        }
        ParseError::Model(_) => {
            CommonServiceException::new("InternalFailure", message).with_status(500)
        }
        ParseError::MalformedRequestBody(_) | ParseError::InvalidScalar { .. } => {
            let code = match protocol {
                Protocol::Query | Protocol::Ec2 => "MalformedQueryString",
                Protocol::Json | Protocol::RestJson => "SerializationException",
                Protocol::RestXml => "MalformedInput",
            };
            CommonServiceException::new(code, message).with_sender_fault(true)
        }
        ParseError::TooManyEntries { .. } => {
            CommonServiceException::new("InvalidParameterValue", message).with_sender_fault(true)
        }
        ParseError::NotImplemented(_) => {
            CommonServiceException::new("InternalFailure", message).with_status(501)
        }
    }
}

/// Move a serialized response into an `http::Response`.
#[must_use]
pub fn into_http_response(raw: RawResponse) -> http::Response<AwsResponseBody> {
    let mut response = http::Response::new(AwsResponseBody::from_bytes(raw.body));
    *response.status_mut() = raw.status;
    *response.headers_mut() = raw.headers;
    response
}

/// Headers every response carries.
pub(crate) fn add_common_headers(
    mut response: http::Response<AwsResponseBody>,
) -> http::Response<AwsResponseBody> {
    let headers = response.headers_mut();
    headers.insert("server", HeaderValue::from_static("RustStack"));
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    response
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use ruststack_aws_protocol::ScalarError;

    use super::*;

    #[test]
    fn test_should_map_unknown_action_per_protocol() {
        let error = ParseError::MissingAction("no Action parameter".to_owned());
        assert_eq!(parse_failure(Protocol::Query, &error).code, "InvalidAction");
        assert_eq!(parse_failure(Protocol::Ec2, &error).code, "InvalidAction");

        let error = ParseError::Model(ModelError::UnknownOperation("Foo.Bar".to_owned()));
        let mapped = parse_failure(Protocol::Json, &error);
        assert_eq!(mapped.code, "UnknownOperationException");
        assert_eq!(mapped.status_code, 400);
        assert!(mapped.sender_fault);
    }

    #[test]
    fn test_should_map_unrouted_rest_request_to_404() {
        let error = ParseError::Model(ModelError::NoMatchingOperation {
            method: "GET".to_owned(),
            path: "/nowhere".to_owned(),
        });
        let mapped = parse_failure(Protocol::RestXml, &error);
        assert_eq!(mapped.code, "UnknownOperationException");
        assert_eq!(mapped.status_code, 404);
    }

    #[test]
    fn test_should_map_malformed_input_per_protocol() {
        let error = ParseError::InvalidScalar {
            member: "DelaySeconds".to_owned(),
            source: ScalarError::InvalidScalarValue {
                expected: "integer",
                value: "soon".to_owned(),
            },
        };
        let code = |protocol| parse_failure(protocol, &error).code;
        assert_eq!(code(Protocol::Query), "MalformedQueryString");
        assert_eq!(code(Protocol::RestJson), "SerializationException");
        assert_eq!(code(Protocol::RestXml), "MalformedInput");
        assert_eq!(parse_failure(Protocol::RestXml, &error).status_code, 400);
    }

    #[test]
    fn test_should_map_unsupported_binding_to_501() {
        let error = ParseError::NotImplemented("uri-bound member Id of GetHostedZone".to_owned());
        let mapped = parse_failure(Protocol::RestXml, &error);
        assert_eq!(mapped.code, "InternalFailure");
        assert_eq!(mapped.status_code, 501);
        assert!(!mapped.sender_fault);

        let error = ParseError::TooManyEntries {
            name: "AttributeName".to_owned(),
            limit: 10,
        };
        assert_eq!(parse_failure(Protocol::Query, &error).status_code, 400);
    }

    #[test]
    fn test_should_convert_raw_response() {
        let mut raw = RawResponse::new(StatusCode::CREATED);
        raw.insert_header("location", "/2013-04-01/hostedzone/Z1").unwrap();
        raw.body = bytes::Bytes::from_static(b"<x/>");

        let response = add_common_headers(into_http_response(raw));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["location"], "/2013-04-01/hostedzone/Z1");
        assert_eq!(response.headers()["server"], "RustStack");
        assert!(matches!(response.body(), AwsResponseBody::Buffered(_)));
    }
}
