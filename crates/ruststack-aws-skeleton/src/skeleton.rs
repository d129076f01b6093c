//! The dispatch core: parse, look up, invoke, serialize.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ruststack_aws_model::{
    CommonServiceException, OperationModel, RawRequest, RawResponse, ServiceException,
    ServiceModel,
};
use ruststack_aws_protocol::{ParserConfig, RequestParser, ResponseSerializer};
use ruststack_core::{AccountId, AwsRegion, RustStackConfig};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::SkeletonError;
use crate::handler::{ServiceApi, ServiceRequestHandler};

/// Status of the dispatch-gap response.
const NOT_IMPLEMENTED_STATUS: u16 = 501;

/// Serves one service model with the handlers of a delegate.
///
/// The dispatch table is built once at construction and never changes, so a
/// `Skeleton` can be shared across threads behind an `Arc`.
pub struct Skeleton<D: ?Sized> {
    service: Arc<ServiceModel>,
    delegate: Arc<D>,
    parser: RequestParser,
    serializer: ResponseSerializer,
    dispatch_table: HashMap<String, ServiceRequestHandler<D>>,
    region: AwsRegion,
    account_id: AccountId,
}

impl<D: ServiceApi> Skeleton<D> {
    /// Build the dispatch table from the delegate's [`ServiceApi::handlers`].
    #[must_use]
    pub fn new(service: Arc<ServiceModel>, delegate: Arc<D>) -> Self {
        Self::with_handlers(service, delegate, D::handlers())
    }
}

impl<D: ?Sized + Send + Sync> Skeleton<D> {
    /// Build the dispatch table from an explicit handler list.
    ///
    /// A later registration for the same operation replaces an earlier one.
    /// Handlers naming operations the model does not declare are kept but
    /// can never be reached.
    pub fn with_handlers(
        service: Arc<ServiceModel>,
        delegate: Arc<D>,
        handlers: impl IntoIterator<Item = ServiceRequestHandler<D>>,
    ) -> Self {
        let mut dispatch_table = HashMap::new();
        for handler in handlers {
            if service.operation_by_name(handler.operation()).is_err() {
                warn!(
                    service = %service.service_name(),
                    operation = %handler.operation(),
                    "registered handler for an operation the model does not declare"
                );
            }
            if let Some(previous) = dispatch_table.insert(handler.operation().to_owned(), handler)
            {
                debug!(
                    service = %service.service_name(),
                    operation = %previous.operation(),
                    "replaced earlier handler registration"
                );
            }
        }

        Self {
            parser: RequestParser::new(Arc::clone(&service)),
            serializer: ResponseSerializer::new(Arc::clone(&service)),
            service,
            delegate,
            dispatch_table,
            region: AwsRegion::default(),
            account_id: AccountId::default(),
        }
    }

    /// Apply the parser bounds and default region/account of `config`.
    #[must_use]
    pub fn with_config(mut self, config: &RustStackConfig) -> Self {
        self.parser =
            RequestParser::with_config(Arc::clone(&self.service), ParserConfig::from(config));
        self.region = config.default_region.clone();
        self.account_id = config.default_account_id.clone();
        self
    }

    /// Replace the response serializer, e.g. to pin request ids.
    #[must_use]
    pub fn with_serializer(mut self, serializer: ResponseSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// The served model.
    #[must_use]
    pub fn service(&self) -> &Arc<ServiceModel> {
        &self.service
    }

    /// The serializer, for errors raised before dispatch.
    #[must_use]
    pub fn serializer(&self) -> &ResponseSerializer {
        &self.serializer
    }

    /// Region used when the caller supplies none.
    #[must_use]
    pub fn default_region(&self) -> &AwsRegion {
        &self.region
    }

    /// Account used when the caller supplies none.
    #[must_use]
    pub fn default_account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Whether a handler is registered for `operation`.
    #[must_use]
    pub fn handles(&self, operation: &str) -> bool {
        self.dispatch_table.contains_key(operation)
    }

    /// Invoke with the default region and account.
    ///
    /// # Errors
    /// See [`Skeleton::invoke_with_context_of`].
    pub fn invoke(&self, request: RawRequest) -> Result<RawResponse, SkeletonError> {
        self.invoke_with_context_of(self.region.clone(), self.account_id.clone(), request)
    }

    /// Parse `request`, run its handler, and serialize the outcome.
    ///
    /// Service exceptions raised by the handler become error responses. An
    /// operation without a handler answers `InternalFailure` with status
    /// 501. Panics in handlers are not caught.
    ///
    /// # Errors
    /// [`SkeletonError::Parse`] when the request does not parse, and
    /// [`SkeletonError::Serialize`] when the handler's answer does not fit
    /// the model.
    pub fn invoke_with_context_of(
        &self,
        region: AwsRegion,
        account_id: AccountId,
        request: RawRequest,
    ) -> Result<RawResponse, SkeletonError> {
        let (operation, params) = self.parser.parse(&request)?;
        let Some(handler) = self.dispatch_table.get(operation.name()) else {
            return self.dispatch_not_implemented(operation);
        };

        debug!(
            service = %self.service.service_name(),
            operation = %operation.name(),
            region = %region.as_str(),
            "dispatching request"
        );
        let context = RequestContext {
            service: Arc::clone(&self.service),
            operation: operation.name().to_owned(),
            region,
            account_id,
            request,
        };
        let response = match handler.call(&self.delegate, context, params) {
            Ok(result) => self.serializer.serialize_to_response(&result, operation)?,
            Err(exception) => {
                debug!(
                    service = %self.service.service_name(),
                    operation = %operation.name(),
                    error = %exception,
                    "handler raised service exception"
                );
                self.serializer.serialize_error_to_response(&exception, operation)?
            }
        };
        Ok(response)
    }

    fn dispatch_not_implemented(
        &self,
        operation: &OperationModel,
    ) -> Result<RawResponse, SkeletonError> {
        let service = self.service.service_name();
        warn!(
            service = %service,
            operation = %operation.name(),
            "no handler registered for operation"
        );
        let error = ServiceException::Common(
            CommonServiceException::new(
                "InternalFailure",
                format!(
                    "API action '{}' for service '{service}' not yet implemented",
                    operation.name()
                ),
            )
            .with_status(NOT_IMPLEMENTED_STATUS),
        );
        Ok(self.serializer.serialize_error_to_response(&error, operation)?)
    }
}

impl<D: ?Sized> fmt::Debug for Skeleton<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.dispatch_table.keys().collect();
        operations.sort();
        f.debug_struct("Skeleton")
            .field("service", &self.service.service_name())
            .field("operations", &operations)
            .field("region", &self.region)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::StatusCode;
    use ruststack_aws_model::{ModeledException, Params, Value, fixtures};
    use ruststack_aws_protocol::XmlElement;
    use ruststack_core::RequestIdGenerator;

    use super::*;
    use crate::handler::{HandlerArgs, HandlerResult};

    #[derive(Debug, Default)]
    struct QueueProvider {
        calls: Mutex<Vec<String>>,
    }

    impl QueueProvider {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn send_message(&self, args: HandlerArgs) -> HandlerResult {
            let region = args
                .context()
                .map(|c| c.region.as_str().to_owned())
                .unwrap_or_default();
            let args = args.into_arguments();
            let body = args.required_str("message_body")?;
            self.record(format!("{region}:{}", args.required_str("queue_url")?));
            Ok(Params::from_iter([
                ("MD5OfMessageBody".to_owned(), Value::from(format!("md5-of-{body}"))),
                ("MessageId".to_owned(), Value::from("msg-1")),
            ]))
        }

        fn list_queues(&self, args: HandlerArgs) -> HandlerResult {
            let HandlerArgs::Positional { context: None, request } = args else {
                panic!("ListQueues expects positional arguments without context");
            };
            let prefix = request
                .get("QueueNamePrefix")
                .and_then(Value::as_str)
                .unwrap_or_default();
            self.record(format!("list:{prefix}"));
            Ok(Params::from_iter([(
                "QueueUrls".to_owned(),
                Value::list([format!("http://localhost:4566/000000000000/{prefix}-a")]),
            )]))
        }

        fn get_queue_url(&self, _args: HandlerArgs) -> HandlerResult {
            Err(ModeledException::new(
                "QueueDoesNotExist",
                "The specified queue does not exist.",
            )
            .into())
        }

        fn purge_queue(&self, _args: HandlerArgs) -> HandlerResult {
            panic!("purge exploded");
        }
    }

    impl ServiceApi for QueueProvider {
        fn handlers() -> Vec<ServiceRequestHandler<Self>> {
            vec![
                ServiceRequestHandler::new("SendMessage", Self::send_message),
                ServiceRequestHandler::new("ListQueues", Self::list_queues)
                    .pass_context(false)
                    .expand_parameters(false),
                ServiceRequestHandler::new("GetQueueUrl", Self::get_queue_url),
                ServiceRequestHandler::new("PurgeQueue", Self::purge_queue),
            ]
        }
    }

    #[derive(Debug)]
    struct FixedIds;

    impl RequestIdGenerator for FixedIds {
        fn generate(&self) -> String {
            "req-fixed".to_owned()
        }
    }

    fn skeleton() -> (Arc<QueueProvider>, Skeleton<QueueProvider>) {
        let provider = Arc::new(QueueProvider::default());
        let service = fixtures::sqs();
        let skeleton = Skeleton::new(Arc::clone(&service), Arc::clone(&provider))
            .with_serializer(ResponseSerializer::with_request_ids(service, Arc::new(FixedIds)));
        (provider, skeleton)
    }

    fn form(body: &str) -> RawRequest {
        RawRequest::post("/")
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(body.to_owned())
    }

    fn xml(response: &RawResponse) -> XmlElement {
        XmlElement::parse(&response.body).unwrap()
    }

    #[test]
    fn test_should_dispatch_expanded_arguments_with_context() {
        let (provider, skeleton) = skeleton();
        let response = skeleton
            .invoke_with_context_of(
                AwsRegion::new("eu-west-1"),
                AccountId::default(),
                form("Action=SendMessage&QueueUrl=http%3A%2F%2Flocalhost%2Fq&MessageBody=hello"),
            )
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let root = xml(&response);
        assert_eq!(root.name, "SendMessageResponse");
        let result = root.child("SendMessageResult").unwrap();
        assert_eq!(result.child("MD5OfMessageBody").unwrap().text, "md5-of-hello");
        assert_eq!(result.child("MessageId").unwrap().text, "msg-1");
        assert_eq!(
            *provider.calls.lock().unwrap(),
            ["eu-west-1:http://localhost/q"]
        );
    }

    #[test]
    fn test_should_dispatch_positional_arguments() {
        let (provider, skeleton) = skeleton();
        let response = skeleton
            .invoke(form("Action=ListQueues&QueueNamePrefix=orders"))
            .unwrap();

        let root = xml(&response);
        let urls = root.child("ListQueuesResult").unwrap();
        assert_eq!(
            urls.child("QueueUrl").unwrap().text,
            "http://localhost:4566/000000000000/orders-a"
        );
        assert_eq!(*provider.calls.lock().unwrap(), ["list:orders"]);
    }

    #[test]
    fn test_should_answer_dispatch_gap_with_internal_failure() {
        let (_, skeleton) = skeleton();
        let response = skeleton
            .invoke(form("Action=DeleteQueue&QueueUrl=http%3A%2F%2Flocalhost%2Fq"))
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
        let error = xml(&response);
        let error = error.child("Error").unwrap();
        assert_eq!(error.child("Code").unwrap().text, "InternalFailure");
        let message = &error.child("Message").unwrap().text;
        assert!(message.contains("DeleteQueue"));
        assert!(message.contains("sqs"));
    }

    #[test]
    fn test_should_answer_dispatch_gap_for_json_protocol() {
        let skeleton: Skeleton<QueueProvider> = Skeleton::with_handlers(
            fixtures::kinesis(),
            Arc::new(QueueProvider::default()),
            [],
        );
        let response = skeleton
            .invoke(
                RawRequest::post("/")
                    .with_header("x-amz-target", "Kinesis_20131202.ListStreams")
                    .with_body("{}"),
            )
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["__type"], "InternalFailure");
        assert_eq!(
            body["message"],
            "API action 'ListStreams' for service 'kinesis' not yet implemented"
        );
    }

    #[test]
    fn test_should_serialize_modeled_exception() {
        let (_, skeleton) = skeleton();
        let response = skeleton
            .invoke(form("Action=GetQueueUrl&QueueName=missing"))
            .unwrap();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let root = xml(&response);
        assert_eq!(root.name, "ErrorResponse");
        let error = root.child("Error").unwrap();
        assert_eq!(error.child("Type").unwrap().text, "Sender");
        assert_eq!(
            error.child("Code").unwrap().text,
            "AWS.SimpleQueueService.NonExistentQueue"
        );
        assert_eq!(root.child("RequestId").unwrap().text, "req-fixed");
    }

    #[test]
    fn test_should_serialize_missing_parameter() {
        let (provider, skeleton) = skeleton();
        let response = skeleton
            .invoke(form("Action=SendMessage&QueueUrl=http%3A%2F%2Flocalhost%2Fq"))
            .unwrap();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let root = xml(&response);
        let error = root.child("Error").unwrap();
        assert_eq!(error.child("Code").unwrap().text, "MissingParameter");
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_should_propagate_parse_errors() {
        let (_, skeleton) = skeleton();
        let result = skeleton.invoke(form("QueueName=orders"));
        assert!(matches!(result, Err(SkeletonError::Parse(_))));
    }

    #[test]
    #[should_panic(expected = "purge exploded")]
    fn test_should_not_catch_handler_panics() {
        let (_, skeleton) = skeleton();
        let _ = skeleton.invoke(form("Action=PurgeQueue&QueueUrl=q"));
    }

    #[test]
    fn test_should_keep_last_registration() {
        fn first(_: &QueueProvider, _: HandlerArgs) -> HandlerResult {
            Ok(Params::from_iter([("QueueUrl".to_owned(), Value::from("first"))]))
        }
        fn second(_: &QueueProvider, _: HandlerArgs) -> HandlerResult {
            Ok(Params::from_iter([("QueueUrl".to_owned(), Value::from("second"))]))
        }

        let skeleton = Skeleton::with_handlers(
            fixtures::sqs(),
            Arc::new(QueueProvider::default()),
            [
                ServiceRequestHandler::new("GetQueueUrl", first),
                ServiceRequestHandler::new("GetQueueUrl", second),
                ServiceRequestHandler::new("NotAnOperation", first),
            ],
        );
        assert!(skeleton.handles("NotAnOperation"));

        let response = skeleton
            .invoke(form("Action=GetQueueUrl&QueueName=orders"))
            .unwrap();
        let root = xml(&response);
        let result = root.child("GetQueueUrlResult").unwrap();
        assert_eq!(result.child("QueueUrl").unwrap().text, "second");
    }

    #[test]
    fn test_should_apply_config_defaults() {
        let config = RustStackConfig::builder()
            .default_region(AwsRegion::new("ap-south-1"))
            .build();
        let (_, skeleton) = skeleton();
        let skeleton = skeleton.with_config(&config);
        assert_eq!(skeleton.default_region().as_str(), "ap-south-1");
        assert_eq!(skeleton.default_account_id().as_str(), AccountId::DEFAULT);
    }
}
