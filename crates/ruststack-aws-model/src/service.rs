//! The loaded service model and its lookup tables.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ModelError;
use crate::operation::{HttpBinding, OperationModel};
use crate::raw::{RawRef, RawServiceModel, RawShape};
use crate::shape::{MemberRef, Shape, ShapeId, ShapeKind, ShapeView};

/// The five wire protocols botocore models declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Form-encoded requests, XML responses with `<Op>Response>` envelopes.
    Query,
    /// EC2 flavor of `query`.
    Ec2,
    /// `X-Amz-Target` routed JSON.
    Json,
    /// REST routing with JSON bodies.
    RestJson,
    /// REST routing with XML bodies.
    RestXml,
}

impl Protocol {
    /// The botocore spelling of the protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Ec2 => "ec2",
            Self::Json => "json",
            Self::RestJson => "rest-json",
            Self::RestXml => "rest-xml",
        }
    }
}

impl FromStr for Protocol {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "ec2" => Ok(Self::Ec2),
            "json" => Ok(Self::Json),
            "rest-json" => Ok(Self::RestJson),
            "rest-xml" => Ok(Self::RestXml),
            other => Err(ModelError::UnsupportedProtocol(other.to_owned())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `metadata` block of a service model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// API version, e.g. `2012-11-05`.
    #[serde(default)]
    pub api_version: String,
    /// Endpoint prefix, e.g. `sqs`.
    #[serde(default)]
    pub endpoint_prefix: String,
    /// Wire protocol name.
    pub protocol: String,
    /// Service id used by SDKs.
    #[serde(default)]
    pub service_id: Option<String>,
    /// Human readable name.
    #[serde(default)]
    pub service_full_name: Option<String>,
    /// SigV4 signing name.
    #[serde(default)]
    pub signing_name: Option<String>,
    /// JSON protocol version (`1.0` or `1.1`).
    #[serde(default)]
    pub json_version: Option<String>,
    /// `X-Amz-Target` prefix of JSON protocol services.
    #[serde(default)]
    pub target_prefix: Option<String>,
    /// Namespace of Query and EC2 responses.
    #[serde(default)]
    pub xml_namespace: Option<String>,
}

/// A fully resolved, immutable service model.
///
/// Every shape reference is checked while loading, so walking the graph
/// afterwards never fails.
#[derive(Debug)]
pub struct ServiceModel {
    service_name: String,
    metadata: ServiceMetadata,
    protocol: Protocol,
    operations: IndexMap<String, OperationModel>,
    shapes: Vec<Shape>,
    shape_index: HashMap<String, ShapeId>,
    http_routes: HashMap<(String, String), String>,
}

impl ServiceModel {
    /// Load a model from `service-2.json` bytes.
    ///
    /// The service name defaults to the endpoint prefix; see
    /// [`with_service_name`](Self::with_service_name).
    pub fn from_slice(json: &[u8]) -> Result<Self, ModelError> {
        let raw: RawServiceModel = serde_json::from_slice(json)?;
        Self::resolve(raw)
    }

    /// Load a model from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    /// Load `<specs_dir>/<service>/<api_version>/service-2.json`, the botocore
    /// data directory layout.
    pub fn load(
        specs_dir: impl AsRef<Path>,
        service: &str,
        api_version: &str,
    ) -> Result<Self, ModelError> {
        let path = specs_dir
            .as_ref()
            .join(service)
            .join(api_version)
            .join("service-2.json");
        Ok(Self::from_path(path)?.with_service_name(service))
    }

    /// Override the service name used in context and error messages.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    fn resolve(raw: RawServiceModel) -> Result<Self, ModelError> {
        let protocol: Protocol = raw.metadata.protocol.parse()?;

        let shape_index: HashMap<String, ShapeId> = raw
            .shapes
            .keys()
            .enumerate()
            .map(|(i, name)| (name.clone(), ShapeId(i)))
            .collect();

        let shapes = raw
            .shapes
            .into_iter()
            .map(|(name, shape)| resolve_shape(&shape_index, name, shape))
            .collect::<Result<Vec<_>, _>>()?;

        let mut operations = IndexMap::with_capacity(raw.operations.len());
        let mut http_routes = HashMap::new();
        for (name, op) in raw.operations {
            let input = op
                .input
                .map(|r| resolve_ref(&shape_index, &name, r))
                .transpose()?;
            let output = op
                .output
                .map(|r| resolve_ref(&shape_index, &name, r))
                .transpose()?;
            let errors = op
                .errors
                .into_iter()
                .map(|r| resolve_ref(&shape_index, &name, r).map(|m| m.target))
                .collect::<Result<Vec<_>, _>>()?;
            let http = HttpBinding {
                method: op.http.method.to_ascii_uppercase(),
                request_uri: op.http.request_uri,
                response_code: op.http.response_code,
            };

            let route = (http.method.clone(), http.path_template().to_owned());
            if let Some(existing) = http_routes.get(&route) {
                tracing::debug!(
                    operation = %name,
                    existing = %existing,
                    method = %route.0,
                    path = %route.1,
                    "HTTP route already bound, keeping the first operation"
                );
            } else {
                http_routes.insert(route, name.clone());
            }

            let checksum_required = op.http_checksum_required
                || op
                    .http_checksum
                    .is_some_and(|c| c.request_checksum_required);
            operations.insert(
                name.clone(),
                OperationModel {
                    name,
                    http,
                    input,
                    output,
                    errors,
                    checksum_required,
                },
            );
        }

        Ok(Self {
            service_name: raw.metadata.endpoint_prefix.clone(),
            metadata: raw.metadata,
            protocol,
            operations,
            shapes,
            shape_index,
            http_routes,
        })
    }

    /// Name of the service (e.g. `sqs`).
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Model metadata.
    #[must_use]
    pub fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    /// Wire protocol.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Look up a shape by name.
    pub fn shape_by_name(&self, name: &str) -> Result<ShapeView<'_>, ModelError> {
        self.shape_index
            .get(name)
            .map(|id| self.view(*id))
            .ok_or_else(|| ModelError::UnknownShape {
                name: name.to_owned(),
                referenced_by: self.service_name.clone(),
            })
    }

    /// View a shape by id, without reference-level traits.
    #[must_use]
    pub fn view(&self, id: ShapeId) -> ShapeView<'_> {
        ShapeView::new(self, &self.shapes[id.0], None)
    }

    pub(crate) fn view_ref<'a>(&'a self, reference: &'a MemberRef) -> ShapeView<'a> {
        ShapeView::new(
            self,
            &self.shapes[reference.target.0],
            Some(&reference.serialization),
        )
    }

    /// Look up an operation by name.
    pub fn operation_by_name(&self, name: &str) -> Result<&OperationModel, ModelError> {
        self.operations
            .get(name)
            .ok_or_else(|| ModelError::UnknownOperation(name.to_owned()))
    }

    /// Look up the operation bound to `method` and exactly the URI template
    /// `path` (any query string on `path` is ignored).
    pub fn operation_by_http(&self, method: &str, path: &str) -> Result<&OperationModel, ModelError> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let key = (method.to_ascii_uppercase(), path.to_owned());
        self.http_routes
            .get(&key)
            .and_then(|name| self.operations.get(name))
            .ok_or(ModelError::NoMatchingOperation {
                method: key.0,
                path: key.1,
            })
    }

    /// All operation names, in model order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// All operations, in model order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationModel> {
        self.operations.values()
    }

    /// Input shape of an operation, with the input reference's traits.
    #[must_use]
    pub fn input_shape<'a>(&'a self, operation: &'a OperationModel) -> Option<ShapeView<'a>> {
        operation.input.as_ref().map(|r| self.view_ref(r))
    }

    /// Output shape of an operation, with the output reference's traits
    /// (including `resultWrapper`).
    #[must_use]
    pub fn output_shape<'a>(&'a self, operation: &'a OperationModel) -> Option<ShapeView<'a>> {
        operation.output.as_ref().map(|r| self.view_ref(r))
    }

    /// Exception shapes an operation declares.
    pub fn error_shapes<'a>(
        &'a self,
        operation: &'a OperationModel,
    ) -> impl Iterator<Item = ShapeView<'a>> + use<'a> {
        operation.errors.iter().map(|id| self.view(*id))
    }

    /// The declared exception shape named `name`.
    #[must_use]
    pub fn error_shape<'a>(
        &'a self,
        operation: &'a OperationModel,
        name: &str,
    ) -> Option<ShapeView<'a>> {
        self.error_shapes(operation).find(|shape| shape.name() == name)
    }
}

fn resolve_ref(
    index: &HashMap<String, ShapeId>,
    referenced_by: &str,
    raw: RawRef,
) -> Result<MemberRef, ModelError> {
    let target = index
        .get(&raw.shape)
        .copied()
        .ok_or_else(|| ModelError::UnknownShape {
            name: raw.shape.clone(),
            referenced_by: referenced_by.to_owned(),
        })?;
    Ok(MemberRef {
        target,
        serialization: raw.serialization,
    })
}

fn resolve_shape(
    index: &HashMap<String, ShapeId>,
    name: String,
    raw: RawShape,
) -> Result<Shape, ModelError> {
    use crate::shape::ShapeType;

    let missing = |part: &str| ModelError::InvalidShape {
        name: name.clone(),
        reason: format!("{} shape without `{part}`", raw.shape_type),
    };

    let kind = match raw.shape_type {
        ShapeType::Structure => ShapeKind::Structure {
            members: raw
                .members
                .into_iter()
                .map(|(member, r)| Ok((member, resolve_ref(index, &name, r)?)))
                .collect::<Result<IndexMap<_, _>, ModelError>>()?,
        },
        ShapeType::List => ShapeKind::List {
            member: resolve_ref(index, &name, raw.member.ok_or_else(|| missing("member"))?)?,
        },
        ShapeType::Map => ShapeKind::Map {
            key: resolve_ref(index, &name, raw.key.ok_or_else(|| missing("key"))?)?,
            value: resolve_ref(index, &name, raw.value.ok_or_else(|| missing("value"))?)?,
        },
        _ => ShapeKind::Scalar,
    };

    Ok(Shape {
        name,
        shape_type: raw.shape_type,
        kind,
        required: raw.required,
        enum_values: raw.enum_values,
        payload: raw.payload,
        error: raw.error,
        exception: raw.exception,
        document: raw.document,
        serialization: raw.serialization,
    })
}
