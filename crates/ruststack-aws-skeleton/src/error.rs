//! Errors surfaced by [`Skeleton`](crate::Skeleton) invocations.

use ruststack_aws_protocol::{ParseError, SerializeError};

/// A request that never reached a handler, or a handler answer that could
/// not be written. Business errors are not represented here; handlers report
/// them as [`ServiceException`](ruststack_aws_model::ServiceException)s and
/// they are serialized like any other response.
#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    /// The request did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The result or exception did not serialize.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}
