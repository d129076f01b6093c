//! Operation descriptors.

use crate::shape::{MemberRef, ShapeId};

/// HTTP binding of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBinding {
    /// Request method (upper case).
    pub method: String,
    /// Request URI template, possibly with a query part (`/?x-id=ListBuckets`).
    pub request_uri: String,
    /// Status of a successful response, when the model declares one.
    pub response_code: Option<u16>,
}

impl HttpBinding {
    /// The path part of the URI template, used as the REST lookup key.
    #[must_use]
    pub fn path_template(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map_or(self.request_uri.as_str(), |(path, _)| path)
    }

    /// Status of a successful response: the declared code, else 200.
    #[must_use]
    pub fn default_status(&self) -> u16 {
        self.response_code.unwrap_or(200)
    }
}

/// A named API action.
#[derive(Debug, Clone)]
pub struct OperationModel {
    pub(crate) name: String,
    pub(crate) http: HttpBinding,
    pub(crate) input: Option<MemberRef>,
    pub(crate) output: Option<MemberRef>,
    pub(crate) errors: Vec<ShapeId>,
    pub(crate) checksum_required: bool,
}

impl OperationModel {
    /// Operation name, e.g. `SendMessage`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP binding.
    #[must_use]
    pub fn http(&self) -> &HttpBinding {
        &self.http
    }

    /// Whether the operation declares an input shape.
    #[must_use]
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Whether the operation declares an output shape.
    #[must_use]
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Whether messages of this operation must carry a `Content-MD5` header.
    #[must_use]
    pub fn checksum_required(&self) -> bool {
        self.checksum_required
    }
}
