//! The handler registration contract.
//!
//! A handler-bearing type implements [`ServiceApi`] and lists one
//! [`ServiceRequestHandler`] per operation it serves. Each entry names the
//! operation and carries the two calling-convention flags read once when the
//! dispatch table is built.

use std::fmt;
use std::sync::Arc;

use ruststack_aws_model::{Params, ServiceException};

use crate::arguments::ServiceArguments;
use crate::context::RequestContext;

/// What a handler returns: output members, or a business error.
pub type HandlerResult = Result<Params, ServiceException>;

/// Arguments passed to a handler, shaped by its calling-convention flags.
#[derive(Debug, Clone)]
pub enum HandlerArgs {
    /// `expand_parameters = true`: members renamed to snake_case.
    Expanded {
        /// Present when `pass_context` is set.
        context: Option<RequestContext>,
        /// Input members by snake_case name.
        arguments: ServiceArguments,
    },
    /// `expand_parameters = false`: the parsed input as-is.
    Positional {
        /// Present when `pass_context` is set.
        context: Option<RequestContext>,
        /// Input members by member name.
        request: Params,
    },
}

impl HandlerArgs {
    /// The injected request context, if the handler asked for one.
    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        match self {
            Self::Expanded { context, .. } | Self::Positional { context, .. } => context.as_ref(),
        }
    }

    /// Expanded arguments, renaming positional input on the fly.
    #[must_use]
    pub fn into_arguments(self) -> ServiceArguments {
        match self {
            Self::Expanded { arguments, .. } => arguments,
            Self::Positional { request, .. } => ServiceArguments::from_params(request),
        }
    }
}

/// One entry of a dispatch table.
pub struct ServiceRequestHandler<D: ?Sized> {
    operation: String,
    pass_context: bool,
    expand_parameters: bool,
    func: Arc<dyn Fn(&D, HandlerArgs) -> HandlerResult + Send + Sync>,
}

impl<D: ?Sized> ServiceRequestHandler<D> {
    /// A handler for `operation` with context passing and parameter
    /// expansion enabled.
    pub fn new<F>(operation: impl Into<String>, func: F) -> Self
    where
        F: Fn(&D, HandlerArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            operation: operation.into(),
            pass_context: true,
            expand_parameters: true,
            func: Arc::new(func),
        }
    }

    /// Whether the handler receives a [`RequestContext`].
    #[must_use]
    pub fn pass_context(mut self, pass_context: bool) -> Self {
        self.pass_context = pass_context;
        self
    }

    /// Whether the handler receives [`HandlerArgs::Expanded`] or
    /// [`HandlerArgs::Positional`].
    #[must_use]
    pub fn expand_parameters(mut self, expand_parameters: bool) -> Self {
        self.expand_parameters = expand_parameters;
        self
    }

    /// Operation name this handler serves.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Invoke the handler on `delegate`.
    ///
    /// # Errors
    /// Whatever service exception the handler raises.
    pub fn call(&self, delegate: &D, context: RequestContext, request: Params) -> HandlerResult {
        let context = self.pass_context.then_some(context);
        let args = if self.expand_parameters {
            HandlerArgs::Expanded {
                context,
                arguments: ServiceArguments::from_params(request),
            }
        } else {
            HandlerArgs::Positional { context, request }
        };
        (self.func)(delegate, args)
    }
}

impl<D: ?Sized> Clone for ServiceRequestHandler<D> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            pass_context: self.pass_context,
            expand_parameters: self.expand_parameters,
            func: Arc::clone(&self.func),
        }
    }
}

impl<D: ?Sized> fmt::Debug for ServiceRequestHandler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRequestHandler")
            .field("operation", &self.operation)
            .field("pass_context", &self.pass_context)
            .field("expand_parameters", &self.expand_parameters)
            .finish_non_exhaustive()
    }
}

/// A type whose methods serve operations of a service.
///
/// ```
/// use ruststack_aws_model::{Params, Value};
/// use ruststack_aws_skeleton::{HandlerArgs, HandlerResult, ServiceApi, ServiceRequestHandler};
///
/// #[derive(Debug)]
/// struct Queues;
///
/// impl Queues {
///     fn get_queue_url(&self, args: HandlerArgs) -> HandlerResult {
///         let args = args.into_arguments();
///         let name = args.required_str("queue_name")?;
///         Ok(Params::from_iter([(
///             "QueueUrl".to_owned(),
///             Value::from(format!("http://localhost:4566/000000000000/{name}")),
///         )]))
///     }
/// }
///
/// impl ServiceApi for Queues {
///     fn handlers() -> Vec<ServiceRequestHandler<Self>> {
///         vec![ServiceRequestHandler::new("GetQueueUrl", Self::get_queue_url).pass_context(false)]
///     }
/// }
/// ```
pub trait ServiceApi: Send + Sync + 'static {
    /// Handlers to register, in registration order.
    fn handlers() -> Vec<ServiceRequestHandler<Self>>
    where
        Self: Sized;
}
