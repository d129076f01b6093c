//! RustStack AWS server - serves one botocore service model.
//!
//! The server loads a `service-2.json`, builds the protocol codecs for it,
//! and answers every recognized operation. No business logic is registered,
//! so each operation replies with the `InternalFailure` (501) error in the
//! service's own wire protocol. Requests that do not parse get the error a
//! real endpoint would send. This makes the binary a conformance target
//! for SDK clients.
//!
//! # Usage
//!
//! ```text
//! SERVICE_MODEL=botocore/data/sqs/2012-11-05/service-2.json ruststack-aws-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SERVICE_MODEL` | *(required)* | Path of the botocore model to serve |
//! | `GATEWAY_LISTEN` | `0.0.0.0:4566` | Bind address |
//! | `DEFAULT_REGION` | `us-east-1` | Region for unsigned requests |
//! | `DEFAULT_ACCOUNT_ID` | `000000000000` | Account placed in request contexts |
//! | `QUERY_MAX_ENTRIES` | `1000` | Bound on Query/EC2 list and map entries |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use ruststack_aws_http::AwsApiHttpService;
use ruststack_aws_model::ServiceModel;
use ruststack_aws_skeleton::{ServiceApi, ServiceRequestHandler, Skeleton};
use ruststack_core::RustStackConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Delegate without handlers: every operation is a dispatch gap.
#[derive(Debug, Default)]
struct Unimplemented;

impl ServiceApi for Unimplemented {
    fn handlers() -> Vec<ServiceRequestHandler<Self>> {
        Vec::new()
    }
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the model named by `SERVICE_MODEL`.
fn load_model(config: &RustStackConfig) -> Result<Arc<ServiceModel>> {
    let path = config
        .service_model
        .as_deref()
        .context("SERVICE_MODEL must name a botocore service-2.json file")?;
    let model = ServiceModel::from_path(path)
        .with_context(|| format!("failed to load service model {path}"))?;
    Ok(Arc::new(model))
}

/// Build the skeleton serving `model` with the configured defaults.
fn build_skeleton(model: Arc<ServiceModel>, config: &RustStackConfig) -> Skeleton<Unimplemented> {
    Skeleton::new(model, Arc::new(Unimplemented)).with_config(config)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: AwsApiHttpService<Unimplemented>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RustStackConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_level)?;

    let model = load_model(&config)?;
    let skeleton = build_skeleton(Arc::clone(&model), &config);
    info!(
        service = %model.service_name(),
        protocol = %model.protocol(),
        operations = model.operation_names().count(),
        region = %config.default_region.as_str(),
        "loaded service model",
    );

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting RustStack AWS server");

    serve(listener, AwsApiHttpService::new(Arc::new(skeleton))).await
}
