//! Errors raised by the scalar codec, the request parsers, and the response
//! serializers.

use ruststack_aws_model::{InvalidHeader, ModelError, ShapeType};

/// A scalar could not be converted from or to its wire text.
#[derive(Debug, thiserror::Error)]
pub enum ScalarError {
    /// The text is not a valid value of the target type.
    #[error("invalid {expected} value: {value:?}")]
    InvalidScalarValue {
        /// Type the text was read as.
        expected: &'static str,
        /// Offending text.
        value: String,
    },

    /// The model names a timestamp format outside iso8601, unixTimestamp, rfc822.
    #[error("unknown timestamp format: {0}")]
    UnknownTimestampFormat(String),
}

impl ScalarError {
    pub(crate) fn invalid(expected: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidScalarValue {
            expected,
            value: value.into(),
        }
    }
}

/// A raw request could not be turned into an operation and parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The operation could not be resolved from the request.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A Query or EC2 request without an `Action` parameter, or a JSON request
    /// without a usable `X-Amz-Target` header.
    #[error("missing operation: {0}")]
    MissingAction(String),

    /// The body is not a well-formed document of the protocol's format.
    #[error("malformed request body: {0}")]
    MalformedRequestBody(String),

    /// A member value could not be converted to its shape's type.
    #[error("invalid value for {member}: {source}")]
    InvalidScalar {
        /// Wire name of the member.
        member: String,
        /// Conversion failure.
        source: ScalarError,
    },

    /// The request uses a binding this parser does not support.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A Query list or map enumerates more entries than allowed.
    #[error("{name} has more than {limit} entries")]
    TooManyEntries {
        /// Wire prefix of the list or map.
        name: String,
        /// Configured bound.
        limit: usize,
    },
}

impl ParseError {
    pub(crate) fn scalar(member: impl Into<String>, source: ScalarError) -> Self {
        Self::InvalidScalar {
            member: member.into(),
            source,
        }
    }
}

/// A result or exception could not be written as a response.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// The value names a member the shape does not declare.
    #[error("shape {shape} has no member {member}")]
    UnknownMember {
        /// Structure shape.
        shape: String,
        /// Member present in the value.
        member: String,
    },

    /// The value does not match the shape's type.
    #[error("{shape} expects a {expected} value, got {actual}")]
    TypeMismatch {
        /// Shape being written.
        shape: String,
        /// Type tag of the shape.
        expected: ShapeType,
        /// Variant of the value.
        actual: &'static str,
    },

    /// A modeled exception names a shape the operation does not declare.
    #[error("operation {operation} does not declare error {name}")]
    UnknownErrorShape {
        /// Operation being answered.
        operation: String,
        /// Exception name.
        name: String,
    },

    /// A header-bound member produced an invalid header.
    #[error(transparent)]
    InvalidHeaderValue(#[from] InvalidHeader),

    /// A status-code member holds a value outside the HTTP status range.
    #[error("invalid status code: {0}")]
    InvalidStatus(i64),

    /// A scalar could not be rendered.
    #[error(transparent)]
    Scalar(#[from] ScalarError),

    /// The XML writer failed.
    #[error("failed to write XML: {0}")]
    Xml(#[from] std::io::Error),

    /// The JSON writer failed.
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}
