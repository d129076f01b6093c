//! botocore `service-2.json` document, as deserialized before resolution.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::service::ServiceMetadata;
use crate::shape::{ErrorMetadata, Serialization, ShapeType};

#[derive(Debug, Deserialize)]
pub(crate) struct RawServiceModel {
    pub metadata: ServiceMetadata,
    #[serde(default)]
    pub operations: IndexMap<String, RawOperation>,
    #[serde(default)]
    pub shapes: IndexMap<String, RawShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawOperation {
    #[serde(default)]
    pub http: RawHttp,
    #[serde(default)]
    pub input: Option<RawRef>,
    #[serde(default)]
    pub output: Option<RawRef>,
    #[serde(default)]
    pub errors: Vec<RawRef>,
    #[serde(default)]
    pub http_checksum_required: bool,
    #[serde(default)]
    pub http_checksum: Option<RawHttpChecksum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawHttp {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_request_uri")]
    pub request_uri: String,
    #[serde(default)]
    pub response_code: Option<u16>,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            method: default_method(),
            request_uri: default_request_uri(),
            response_code: None,
        }
    }
}

fn default_method() -> String {
    "POST".to_owned()
}

fn default_request_uri() -> String {
    "/".to_owned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawHttpChecksum {
    #[serde(default)]
    pub request_checksum_required: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRef {
    pub shape: String,
    #[serde(flatten)]
    pub serialization: Serialization,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawShape {
    #[serde(rename = "type")]
    pub shape_type: ShapeType,
    #[serde(default)]
    pub members: IndexMap<String, RawRef>,
    #[serde(default)]
    pub member: Option<RawRef>,
    #[serde(default)]
    pub key: Option<RawRef>,
    #[serde(default)]
    pub value: Option<RawRef>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorMetadata>,
    #[serde(default)]
    pub exception: bool,
    #[serde(default)]
    pub document: bool,
    #[serde(flatten)]
    pub serialization: Serialization,
}
