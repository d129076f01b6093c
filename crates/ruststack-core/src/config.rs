//! Configuration management for RustStack services.
//!
//! All configuration is driven by environment variables, matching LocalStack conventions.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{RustStackError, RustStackResult};
use crate::types::{AccountId, AwsRegion};

/// Default upper bound for Query-protocol list and map enumeration.
const DEFAULT_QUERY_MAX_ENTRIES: usize = 1000;

/// Global configuration for RustStack.
///
/// # Examples
///
/// ```
/// use ruststack_core::RustStackConfig;
///
/// let config = RustStackConfig::builder().query_max_entries(10).build();
/// assert_eq!(config.query_max_entries, 10);
/// assert_eq!(config.default_region.as_str(), "us-east-1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct RustStackConfig {
    /// Bind address for the gateway.
    #[builder(default = String::from("0.0.0.0:4566"))]
    pub gateway_listen: String,

    /// Region used when a request carries no credential scope.
    #[builder(default)]
    pub default_region: AwsRegion,

    /// Account placed in every request context.
    #[builder(default)]
    pub default_account_id: AccountId,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Path of the botocore `service-2.json` model to serve.
    #[builder(default, setter(strip_option))]
    pub service_model: Option<String>,

    /// Maximum number of entries a Query-protocol list or map may carry.
    #[builder(default = DEFAULT_QUERY_MAX_ENTRIES)]
    pub query_max_entries: usize,
}

impl Default for RustStackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RustStackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:4566` |
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `DEFAULT_ACCOUNT_ID` | `000000000000` |
    /// | `LOG_LEVEL` | `info` |
    /// | `SERVICE_MODEL` | *(unset)* |
    /// | `QUERY_MAX_ENTRIES` | `1000` |
    ///
    /// # Errors
    ///
    /// Returns an error if `DEFAULT_ACCOUNT_ID` is not a 12-digit account id
    /// or `QUERY_MAX_ENTRIES` is not a positive integer.
    pub fn from_env() -> RustStackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RustStackResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("DEFAULT_ACCOUNT_ID") {
            config.default_account_id = AccountId::new(v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("SERVICE_MODEL") {
            if !v.is_empty() {
                config.service_model = Some(v);
            }
        }
        if let Some(v) = lookup("QUERY_MAX_ENTRIES") {
            config.query_max_entries = match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(RustStackError::Config(format!(
                        "QUERY_MAX_ENTRIES must be a positive integer, got {v:?}"
                    )));
                }
            };
        }

        Ok(config)
    }
}
