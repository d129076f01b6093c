//! Account and region identifiers carried by every request context.

use std::fmt;
use std::str::FromStr;

use crate::error::RustStackError;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Default account ID used by LocalStack.
    pub const DEFAULT: &str = "000000000000";

    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, RustStackError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(RustStackError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl FromStr for AccountId {
    type Err = RustStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Default region used by LocalStack.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Extract the region from a SigV4 `Authorization` header value.
    ///
    /// The credential scope has the form
    /// `Credential=<access-key>/<date>/<region>/<service>/aws4_request`.
    ///
    /// ```
    /// use ruststack_core::AwsRegion;
    ///
    /// let header = "AWS4-HMAC-SHA256 Credential=AKID/20211009/eu-central-1/sqs/aws4_request, \
    ///               SignedHeaders=host, Signature=abc";
    /// let region = AwsRegion::from_authorization(header).unwrap();
    /// assert_eq!(region.as_str(), "eu-central-1");
    /// ```
    #[must_use]
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (_, rest) = header.split_once("Credential=")?;
        let scope = rest.split([',', ' ']).next()?;
        let region = scope.split('/').nth(2)?;
        (!region.is_empty()).then(|| Self::new(region))
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
