//! HTTP edge for model-driven `RustStack` services.
//!
//! - **Service**: hyper `Service` that buffers the request, runs the
//!   [`Skeleton`](ruststack_aws_skeleton::Skeleton) on the blocking pool, and
//!   returns its response
//! - **Response helpers**: mapping of parse failures to protocol-shaped error
//!   responses and conversion to `http::Response`

pub mod body;
pub mod response;
pub mod service;

pub use body::AwsResponseBody;
pub use response::parse_failure;
pub use service::{AwsApiHttpService, handle};
