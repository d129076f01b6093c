//! Hyper service running a [`Skeleton`] per request.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use ruststack_aws_model::{CommonServiceException, RawRequest, RawResponse};
use ruststack_aws_skeleton::{Skeleton, SkeletonError};
use ruststack_core::{AccountId, AwsRegion};
use tracing::{debug, error};

use crate::body::AwsResponseBody;
use crate::response::{add_common_headers, into_http_response, parse_failure};

/// Hyper `Service` serving one AWS service model.
///
/// Handlers run synchronously, so each request is handed to the blocking
/// pool once its body has been read.
pub struct AwsApiHttpService<D: ?Sized> {
    skeleton: Arc<Skeleton<D>>,
}

impl<D: ?Sized + Send + Sync + 'static> AwsApiHttpService<D> {
    /// Create a new `AwsApiHttpService`.
    #[must_use]
    pub fn new(skeleton: Arc<Skeleton<D>>) -> Self {
        Self { skeleton }
    }

    /// The wrapped skeleton.
    #[must_use]
    pub fn skeleton(&self) -> &Arc<Skeleton<D>> {
        &self.skeleton
    }
}

impl<D: ?Sized> Clone for AwsApiHttpService<D> {
    fn clone(&self) -> Self {
        Self {
            skeleton: Arc::clone(&self.skeleton),
        }
    }
}

impl<D: ?Sized> fmt::Debug for AwsApiHttpService<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsApiHttpService")
            .field("skeleton", &self.skeleton)
            .finish()
    }
}

impl<D: ?Sized + Send + Sync + 'static> hyper::service::Service<http::Request<Incoming>>
    for AwsApiHttpService<D>
{
    type Response = http::Response<AwsResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let skeleton = Arc::clone(&self.skeleton);

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let response = match collect_body(incoming).await {
                Ok(body) => handle(skeleton, parts, body).await,
                Err(e) => into_http_response(error_response(&skeleton, &e)),
            };
            Ok(add_common_headers(response))
        })
    }
}

/// Run a buffered request through the skeleton on the blocking pool.
///
/// The region comes from the SigV4 credential scope of the `Authorization`
/// header when present, otherwise from the skeleton's default. A panicking
/// handler resumes its panic on the calling task.
pub async fn handle<D: ?Sized + Send + Sync + 'static>(
    skeleton: Arc<Skeleton<D>>,
    parts: http::request::Parts,
    body: Bytes,
) -> http::Response<AwsResponseBody> {
    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
    let request = RawRequest {
        method: parts.method,
        path,
        headers: parts.headers,
        body,
    };
    let region = request
        .header("authorization")
        .and_then(AwsRegion::from_authorization)
        .unwrap_or_else(|| skeleton.default_region().clone());
    let account_id = skeleton.default_account_id().clone();

    let worker = Arc::clone(&skeleton);
    match tokio::task::spawn_blocking(move || respond(&worker, region, account_id, request)).await
    {
        Ok(raw) => into_http_response(raw),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            error!(error = %e, "request task was cancelled");
            let failure = CommonServiceException::new("InternalError", e.to_string())
                .with_status(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            into_http_response(error_response(&skeleton, &failure))
        }
    }
}

/// Invoke the skeleton, turning failures before or after dispatch into
/// protocol-shaped error responses.
fn respond<D: ?Sized + Send + Sync>(
    skeleton: &Skeleton<D>,
    region: AwsRegion,
    account_id: AccountId,
    request: RawRequest,
) -> RawResponse {
    match skeleton.invoke_with_context_of(region, account_id, request) {
        Ok(response) => response,
        Err(SkeletonError::Parse(e)) => {
            debug!(
                service = %skeleton.service().service_name(),
                error = %e,
                "rejected unparsable request"
            );
            error_response(skeleton, &parse_failure(skeleton.service().protocol(), &e))
        }
        Err(SkeletonError::Serialize(e)) => {
            error!(
                service = %skeleton.service().service_name(),
                error = %e,
                "handler result does not fit the service model"
            );
            let failure = CommonServiceException::new("InternalError", e.to_string())
                .with_status(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            error_response(skeleton, &failure)
        }
    }
}

fn error_response<D: ?Sized + Send + Sync>(
    skeleton: &Skeleton<D>,
    failure: &CommonServiceException,
) -> RawResponse {
    skeleton
        .serializer()
        .serialize_unbound_error(failure)
        .unwrap_or_else(|e| {
            error!(code = %failure.code, error = %e, "failed to serialize error response");
            RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, CommonServiceException> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            let message = format!("Failed to read request body: {e}");
            CommonServiceException::new("InternalError", message)
                .with_status(StatusCode::INTERNAL_SERVER_ERROR.as_u16())
        })
}

#[cfg(test)]
mod tests {
    use ruststack_aws_model::{Params, Value, fixtures};
    use ruststack_aws_protocol::XmlElement;
    use ruststack_aws_skeleton::{HandlerArgs, HandlerResult, ServiceApi, ServiceRequestHandler};

    use super::*;

    #[derive(Debug)]
    struct Regional;

    impl Regional {
        fn get_queue_url(&self, args: HandlerArgs) -> HandlerResult {
            let region = args
                .context()
                .map(|c| c.region.as_str().to_owned())
                .unwrap_or_default();
            let args = args.into_arguments();
            let name = args.required_str("queue_name")?;
            Ok(Params::from_iter([(
                "QueueUrl".to_owned(),
                Value::from(format!("http://sqs.{region}.localhost:4566/000000000000/{name}")),
            )]))
        }
    }

    impl ServiceApi for Regional {
        fn handlers() -> Vec<ServiceRequestHandler<Self>> {
            vec![ServiceRequestHandler::new("GetQueueUrl", Self::get_queue_url)]
        }
    }

    fn sqs() -> Arc<Skeleton<Regional>> {
        Arc::new(Skeleton::new(fixtures::sqs(), Arc::new(Regional)))
    }

    fn parts(method: &str, uri: &str, headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn body_of(response: http::Response<AwsResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_should_take_region_from_credential_scope() {
        let auth = "AWS4-HMAC-SHA256 Credential=test/20240102/eu-central-1/sqs/aws4_request, \
                    SignedHeaders=host, Signature=abc";
        let response = handle(
            sqs(),
            parts("POST", "/", &[("authorization", auth)]),
            Bytes::from_static(b"Action=GetQueueUrl&QueueName=orders"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let root = XmlElement::parse(&body_of(response).await).unwrap();
        let url = &root
            .child("GetQueueUrlResult")
            .and_then(|r| r.child("QueueUrl"))
            .unwrap()
            .text;
        assert_eq!(url, "http://sqs.eu-central-1.localhost:4566/000000000000/orders");
    }

    #[tokio::test]
    async fn test_should_read_query_parameters_from_url() {
        let response = handle(
            sqs(),
            parts("GET", "/?Action=GetQueueUrl&QueueName=jobs", &[]),
            Bytes::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_of(response).await;
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("us-east-1"));
        assert!(text.contains("/jobs"));
    }

    #[tokio::test]
    async fn test_should_answer_dispatch_gap_with_501() {
        let response = handle(
            sqs(),
            parts("POST", "/", &[]),
            Bytes::from_static(b"Action=ListQueues"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let root = XmlElement::parse(&body_of(response).await).unwrap();
        let code = &root.child("Error").and_then(|e| e.child("Code")).unwrap().text;
        assert_eq!(code, "InternalFailure");
    }

    #[tokio::test]
    async fn test_should_answer_unknown_action_with_invalid_action() {
        let response = handle(
            sqs(),
            parts("POST", "/", &[]),
            Bytes::from_static(b"Action=LaunchRockets"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let root = XmlElement::parse(&body_of(response).await).unwrap();
        assert_eq!(root.name, "ErrorResponse");
        let error = root.child("Error").unwrap();
        assert_eq!(error.child("Code").unwrap().text, "InvalidAction");
        assert_eq!(error.child("Type").unwrap().text, "Sender");
    }

    #[tokio::test]
    async fn test_should_answer_malformed_json_with_serialization_exception() {
        let skeleton: Arc<Skeleton<Regional>> = Arc::new(Skeleton::with_handlers(
            fixtures::kinesis(),
            Arc::new(Regional),
            [],
        ));
        let response = handle(
            skeleton,
            parts(
                "POST",
                "/",
                &[("x-amz-target", "Kinesis_20131202.PutRecord")],
            ),
            Bytes::from_static(b"{not json"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/x-amz-json-1.1"
        );
        let body: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["__type"], "SerializationException");
    }

    #[tokio::test]
    async fn test_should_answer_unrouted_rest_request_with_404() {
        let skeleton: Arc<Skeleton<Regional>> = Arc::new(Skeleton::with_handlers(
            fixtures::lambda(),
            Arc::new(Regional),
            [],
        ));
        let response = handle(skeleton, parts("DELETE", "/nowhere", &[]), Bytes::new()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["x-amzn-errortype"],
            "UnknownOperationException"
        );
    }
}
