//! Request metadata injected into handlers.

use std::sync::Arc;

use ruststack_aws_model::{RawRequest, ServiceModel};
use ruststack_core::{AccountId, AwsRegion};

/// Where a request came from and what it resolved to.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Model of the service being invoked.
    pub service: Arc<ServiceModel>,
    /// Name of the resolved operation.
    pub operation: String,
    /// Region the request is scoped to.
    pub region: AwsRegion,
    /// Account the request is scoped to.
    pub account_id: AccountId,
    /// The request as received.
    pub request: RawRequest,
}

impl RequestContext {
    /// Service name of the invoked model.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.service.service_name()
    }
}
