//! Model-driven AWS wire protocol codecs for `RustStack`.
//!
//! Nothing in this crate is generated per service. Given a loaded
//! [`ServiceModel`](ruststack_aws_model::ServiceModel), the parsers and
//! serializers walk its shapes at runtime.
//!
//! # Key components
//!
//! - [`RequestParser`] turns a [`RawRequest`](ruststack_aws_model::RawRequest)
//!   into the operation it invokes and its input parameters
//! - [`ResponseSerializer`] writes results and service exceptions as
//!   protocol-correct [`RawResponse`](ruststack_aws_model::RawResponse)s
//! - [`scalar`] converts scalar values to and from their wire text
//!
//! # Protocols
//!
//! | Protocol    | Request                                | Response body                      |
//! |-------------|----------------------------------------|------------------------------------|
//! | `query`     | form-encoded `Action=...`              | `<OpResponse>` with `<OpResult>`   |
//! | `ec2`       | form-encoded, no list infix            | `<OpResponse>` with `<requestId>`  |
//! | `json`      | `X-Amz-Target` + JSON body             | JSON object, `__type` on errors    |
//! | `rest-json` | method + path, headers, JSON body      | JSON object                        |
//! | `rest-xml`  | method + path, headers, XML body       | bare XML root                      |

pub mod error;
pub mod parser;
pub mod scalar;
pub mod serializer;
pub mod xml;

pub use error::{ParseError, ScalarError, SerializeError};
pub use parser::{DEFAULT_MAX_LIST_ENTRIES, ParserConfig, RequestParser};
pub use scalar::TimestampFormat;
pub use serializer::{
    BodyCodec, ErrorDetails, MetadataDecorator, ResponseSerializer, SerializationContext,
};
pub use xml::XmlElement;
