//! Service exceptions raised by handlers.
//!
//! A handler reports a business error by returning a [`ServiceException`]
//! instead of panicking. Modeled exceptions name an error shape of the
//! operation and take their code and status from its metadata; common
//! exceptions carry code, status, and fault explicitly.

use crate::value::{Params, Value};

/// Error returned by a service handler.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceException {
    /// An exception declared in the service model.
    #[error(transparent)]
    Modeled(#[from] ModeledException),
    /// An exception not present in the service model.
    #[error(transparent)]
    Common(#[from] CommonServiceException),
}

impl ServiceException {
    /// A modeled exception without extra fields.
    pub fn modeled(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Modeled(ModeledException::new(name, message))
    }

    /// A common exception with status 400 and no sender fault.
    pub fn common(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Common(CommonServiceException::new(code, message))
    }

    /// The human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Modeled(e) => &e.message,
            Self::Common(e) => &e.message,
        }
    }
}

/// An exception matching an error shape by name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct ModeledException {
    /// Name of the error shape, e.g. `QueueDoesNotExist`.
    pub name: String,
    /// Human readable message.
    pub message: String,
    /// Additional members of the error shape.
    pub fields: Params,
}

impl ModeledException {
    /// A modeled exception without extra fields.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            fields: Params::new(),
        }
    }

    /// Attach a member of the error shape.
    #[must_use]
    pub fn with_field(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(member.into(), value.into());
        self
    }
}

/// An exception that carries its wire metadata explicitly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct CommonServiceException {
    /// Wire error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// HTTP status.
    pub status_code: u16,
    /// Whether the caller is at fault.
    pub sender_fault: bool,
}

impl CommonServiceException {
    /// A common exception with status 400 and no sender fault.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status_code: 400,
            sender_fault: false,
        }
    }

    /// Override the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Mark the caller as the source of the fault.
    #[must_use]
    pub fn with_sender_fault(mut self, sender_fault: bool) -> Self {
        self.sender_fault = sender_fault;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_common_exception_to_400() {
        let error = CommonServiceException::new("InvalidParameterValue", "bad");
        assert_eq!(error.status_code, 400);
        assert!(!error.sender_fault);

        let error = error.with_status(501).with_sender_fault(true);
        assert_eq!(error.status_code, 501);
        assert!(error.sender_fault);
    }

    #[test]
    fn test_should_expose_message_of_either_origin() {
        let modeled = ServiceException::modeled("QueueDoesNotExist", "no such queue");
        assert_eq!(modeled.message(), "no such queue");
        assert_eq!(modeled.to_string(), "QueueDoesNotExist: no such queue");

        let common = ServiceException::common("AccessDenied", "nope");
        assert_eq!(common.message(), "nope");
    }

    #[test]
    fn test_should_attach_fields_to_modeled_exception() {
        let error = ModeledException::new("TooManyRequestsException", "slow down")
            .with_field("Reason", "CallerRateLimitExceeded");
        assert_eq!(
            error.fields["Reason"],
            Value::from("CallerRateLimitExceeded")
        );
    }
}
