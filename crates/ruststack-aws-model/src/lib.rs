//! botocore service model accessor for RustStack.
//!
//! This crate loads a `service-2.json` description and exposes it as an
//! immutable, fully resolved shape graph. The protocol crate walks this graph
//! to parse requests and serialize responses; nothing here knows about wire
//! formats.
//!
//! It also defines the values that flow between the codec layer and service
//! handlers: the [`Value`] parameter tree, the HTTP-shaped [`RawRequest`] and
//! [`RawResponse`], and the [`ServiceException`] taxonomy.

pub mod error;
pub mod exception;
pub mod operation;
mod raw;
pub mod service;
pub mod shape;
pub mod value;
pub mod wire;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use error::{InvalidHeader, ModelError};
pub use exception::{CommonServiceException, ModeledException, ServiceException};
pub use operation::{HttpBinding, OperationModel};
pub use service::{Protocol, ServiceMetadata, ServiceModel};
pub use shape::{
    ErrorMetadata, Location, MemberRef, Serialization, Shape, ShapeId, ShapeKind, ShapeType,
    ShapeView, XmlNamespace,
};
pub use value::{Params, Value};
pub use wire::{RawRequest, RawResponse};
