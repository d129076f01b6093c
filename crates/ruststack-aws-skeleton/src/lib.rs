//! Operation dispatch for `RustStack` services.
//!
//! A [`Skeleton`] owns the request parser and response serializer of one
//! service model and a dispatch table of [`ServiceRequestHandler`]s. Each
//! invocation runs parse, lookup, handler call, and serialization:
//!
//! ```text
//! RawRequest -> RequestParser -> (operation, params)
//!            -> handler(delegate, HandlerArgs) -> Params | ServiceException
//!            -> ResponseSerializer -> RawResponse
//! ```
//!
//! Operations without a registered handler answer with the common
//! `InternalFailure` exception and status 501.

pub mod arguments;
pub mod context;
pub mod error;
pub mod handler;
pub mod naming;
pub mod skeleton;

pub use arguments::ServiceArguments;
pub use context::RequestContext;
pub use error::SkeletonError;
pub use handler::{HandlerArgs, HandlerResult, ServiceApi, ServiceRequestHandler};
pub use naming::xform_name;
pub use skeleton::Skeleton;
