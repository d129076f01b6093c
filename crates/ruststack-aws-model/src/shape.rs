//! Shapes, member references, and the merged serialization view over them.
//!
//! botocore declares serialization traits in two places: on the shape itself
//! and on the reference that points at it from a structure member (or from a
//! list/map, or from an operation's input/output). [`ShapeView`] pairs a shape
//! with the reference it was reached through and answers trait queries with
//! the reference-level value first, exactly like botocore's merged
//! `serialization` dictionary.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::service::ServiceModel;

/// The type tag of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Named members.
    Structure,
    /// Ordered sequence of one member shape.
    List,
    /// Key/value pairs.
    Map,
    /// Text, possibly restricted by `enum`.
    String,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Boolean.
    Boolean,
    /// Binary data, base64 on text wires.
    Blob,
    /// Point in time.
    Timestamp,
}

impl ShapeType {
    /// The botocore spelling of this type tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::List => "list",
            Self::Map => "map",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
        }
    }

    /// Whether this type has no nested shapes.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Structure | Self::List | Self::Map)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a member lives in an HTTP message, for REST protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Location {
    /// A single header named by `locationName`.
    #[serde(rename = "header")]
    Header,
    /// Every header starting with the `locationName` prefix, as a map.
    #[serde(rename = "headers")]
    Headers,
    /// A query string parameter.
    #[serde(rename = "querystring")]
    QueryString,
    /// A label in the request URI template.
    #[serde(rename = "uri")]
    Uri,
    /// The HTTP status code of a response.
    #[serde(rename = "statusCode")]
    StatusCode,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Headers => "headers",
            Self::QueryString => "querystring",
            Self::Uri => "uri",
            Self::StatusCode => "statusCode",
        })
    }
}

/// An XML namespace declaration attached to a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNamespace {
    /// Namespace URI.
    pub uri: String,
    /// Optional prefix; `None` declares the default namespace.
    pub prefix: Option<String>,
}

impl XmlNamespace {
    /// The attribute name declaring this namespace (`xmlns` or `xmlns:<prefix>`).
    #[must_use]
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        }
    }
}

impl<'de> Deserialize<'de> for XmlNamespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Uri(String),
            Full {
                uri: String,
                #[serde(default)]
                prefix: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Uri(uri) => Self { uri, prefix: None },
            Repr::Full { uri, prefix } => Self { uri, prefix },
        })
    }
}

/// Serialization traits as they appear on a shape or a shape reference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Serialization {
    /// HTTP location for REST protocols.
    #[serde(default)]
    pub location: Option<Location>,
    /// Wire name override.
    #[serde(default)]
    pub location_name: Option<String>,
    /// EC2 query key override.
    #[serde(default)]
    pub query_name: Option<String>,
    /// Drop one nesting level for lists and maps.
    #[serde(default)]
    pub flattened: bool,
    /// Serialize as an XML attribute of the parent element.
    #[serde(default)]
    pub xml_attribute: bool,
    /// Namespace declared on the element.
    #[serde(default)]
    pub xml_namespace: Option<XmlNamespace>,
    /// `iso8601`, `unixTimestamp` or `rfc822`.
    #[serde(default)]
    pub timestamp_format: Option<String>,
    /// Query-protocol element wrapping the operation output.
    #[serde(default)]
    pub result_wrapper: Option<String>,
    /// Blob or string carried as a raw, unbuffered body.
    #[serde(default)]
    pub streaming: bool,
    /// Event stream structure.
    #[serde(default, rename = "eventstream")]
    pub event_stream: bool,
    /// String holding a JSON document (base64-encoded when in a header).
    #[serde(default, rename = "jsonvalue")]
    pub json_value: bool,
    /// Member that also forms part of the endpoint host.
    #[serde(default)]
    pub host_label: bool,
}

/// Error metadata carried by exception shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetadata {
    /// Wire error code; the shape name is used when absent.
    #[serde(default)]
    pub code: Option<String>,
    /// HTTP status; 400 when absent.
    #[serde(default)]
    pub http_status_code: Option<u16>,
    /// Whether the caller is at fault.
    #[serde(default)]
    pub sender_fault: bool,
}

/// Index of a shape inside its [`ServiceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub(crate) usize);

/// A resolved reference to a shape, with the traits declared at the reference.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub(crate) target: ShapeId,
    pub(crate) serialization: Serialization,
}

impl MemberRef {
    /// Referenced shape.
    #[must_use]
    pub fn target(&self) -> ShapeId {
        self.target
    }

    /// Traits declared on the reference itself.
    #[must_use]
    pub fn serialization(&self) -> &Serialization {
        &self.serialization
    }
}

/// Nested shapes, by type.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    /// Members in declaration order.
    Structure {
        /// Member name to reference.
        members: IndexMap<String, MemberRef>,
    },
    /// The list element.
    List {
        /// Element reference.
        member: MemberRef,
    },
    /// Map key and value.
    Map {
        /// Key reference.
        key: MemberRef,
        /// Value reference.
        value: MemberRef,
    },
    /// No nested shapes.
    Scalar,
}

/// A named node of the service's type graph.
#[derive(Debug, Clone)]
pub struct Shape {
    pub(crate) name: String,
    pub(crate) shape_type: ShapeType,
    pub(crate) kind: ShapeKind,
    pub(crate) required: Vec<String>,
    pub(crate) enum_values: Vec<String>,
    pub(crate) payload: Option<String>,
    pub(crate) error: Option<ErrorMetadata>,
    pub(crate) exception: bool,
    pub(crate) document: bool,
    pub(crate) serialization: Serialization,
}

impl Shape {
    /// Shape name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Nested shapes.
    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Traits declared on the shape.
    #[must_use]
    pub fn serialization(&self) -> &Serialization {
        &self.serialization
    }
}

/// A shape as reached through a particular reference.
#[derive(Clone, Copy)]
pub struct ShapeView<'a> {
    model: &'a ServiceModel,
    shape: &'a Shape,
    reference: Option<&'a Serialization>,
}

impl fmt::Debug for ShapeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeView")
            .field("name", &self.shape.name)
            .field("type", &self.shape.shape_type)
            .field("reference", &self.reference)
            .finish()
    }
}

impl<'a> ShapeView<'a> {
    pub(crate) fn new(
        model: &'a ServiceModel,
        shape: &'a Shape,
        reference: Option<&'a Serialization>,
    ) -> Self {
        Self {
            model,
            shape,
            reference,
        }
    }

    /// The underlying shape.
    #[must_use]
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Shape name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.shape.name
    }

    /// Type tag.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type
    }

    /// Nested shapes.
    #[must_use]
    pub fn kind(&self) -> &'a ShapeKind {
        &self.shape.kind
    }

    /// Structure members in declaration order; empty for other types.
    pub fn members(&self) -> impl Iterator<Item = (&'a str, ShapeView<'a>)> + use<'a> {
        let model = self.model;
        let members = match &self.shape.kind {
            ShapeKind::Structure { members } => Some(members),
            _ => None,
        };
        members
            .into_iter()
            .flat_map(IndexMap::iter)
            .map(move |(name, reference)| (name.as_str(), model.view_ref(reference)))
    }

    /// A structure member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<ShapeView<'a>> {
        match &self.shape.kind {
            ShapeKind::Structure { members } => members.get(name).map(|r| self.model.view_ref(r)),
            _ => None,
        }
    }

    /// Whether a structure declares `name` as a member.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        matches!(&self.shape.kind, ShapeKind::Structure { members } if members.contains_key(name))
    }

    /// The list element shape.
    #[must_use]
    pub fn list_member(&self) -> Option<ShapeView<'a>> {
        match &self.shape.kind {
            ShapeKind::List { member } => Some(self.model.view_ref(member)),
            _ => None,
        }
    }

    /// The map key shape.
    #[must_use]
    pub fn map_key(&self) -> Option<ShapeView<'a>> {
        match &self.shape.kind {
            ShapeKind::Map { key, .. } => Some(self.model.view_ref(key)),
            _ => None,
        }
    }

    /// The map value shape.
    #[must_use]
    pub fn map_value(&self) -> Option<ShapeView<'a>> {
        match &self.shape.kind {
            ShapeKind::Map { value, .. } => Some(self.model.view_ref(value)),
            _ => None,
        }
    }

    /// Members the model marks as required.
    #[must_use]
    pub fn required(&self) -> &'a [String] {
        &self.shape.required
    }

    /// Allowed values of an enum string shape.
    #[must_use]
    pub fn enum_values(&self) -> &'a [String] {
        &self.shape.enum_values
    }

    /// Name of the member that forms the whole HTTP body.
    #[must_use]
    pub fn payload(&self) -> Option<&'a str> {
        self.shape.payload.as_deref()
    }

    /// Error metadata of an exception shape.
    #[must_use]
    pub fn error(&self) -> Option<&'a ErrorMetadata> {
        self.shape.error.as_ref()
    }

    /// Whether the shape is an exception.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.shape.exception || self.shape.error.is_some()
    }

    /// Whether the structure is an untyped document.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.shape.document
    }

    fn string_trait(&self, pick: impl Fn(&'a Serialization) -> Option<&'a String>) -> Option<&'a str> {
        self.reference
            .and_then(&pick)
            .or_else(|| pick(&self.shape.serialization))
            .map(String::as_str)
    }

    fn flag(&self, pick: impl Fn(&Serialization) -> bool) -> bool {
        self.reference.is_some_and(&pick) || pick(&self.shape.serialization)
    }

    /// HTTP location.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.reference
            .and_then(|s| s.location)
            .or(self.shape.serialization.location)
    }

    /// Wire name override (`locationName`).
    #[must_use]
    pub fn location_name(&self) -> Option<&'a str> {
        self.string_trait(|s| s.location_name.as_ref())
    }

    /// The wire name, falling back to `default` when not overridden.
    #[must_use]
    pub fn serialized_name<'b>(&self, default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.location_name().unwrap_or(default)
    }

    /// EC2 query key override.
    #[must_use]
    pub fn query_name(&self) -> Option<&'a str> {
        self.string_trait(|s| s.query_name.as_ref())
    }

    /// Whether lists and maps drop their wrapper level.
    #[must_use]
    pub fn is_flattened(&self) -> bool {
        self.flag(|s| s.flattened)
    }

    /// Whether the value belongs in an attribute of the parent element.
    #[must_use]
    pub fn is_xml_attribute(&self) -> bool {
        self.flag(|s| s.xml_attribute)
    }

    /// Namespace to declare on the element.
    #[must_use]
    pub fn xml_namespace(&self) -> Option<&'a XmlNamespace> {
        self.reference
            .and_then(|s| s.xml_namespace.as_ref())
            .or(self.shape.serialization.xml_namespace.as_ref())
    }

    /// Timestamp format override.
    #[must_use]
    pub fn timestamp_format(&self) -> Option<&'a str> {
        self.string_trait(|s| s.timestamp_format.as_ref())
    }

    /// Query-protocol result wrapper element name.
    #[must_use]
    pub fn result_wrapper(&self) -> Option<&'a str> {
        self.string_trait(|s| s.result_wrapper.as_ref())
    }

    /// Whether the blob or string is a raw streaming body.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.flag(|s| s.streaming)
    }

    /// Whether the structure is an event stream.
    #[must_use]
    pub fn is_event_stream(&self) -> bool {
        self.flag(|s| s.event_stream)
    }

    /// Whether the string carries a JSON document.
    #[must_use]
    pub fn is_json_value(&self) -> bool {
        self.flag(|s| s.json_value)
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures;

    use super::*;

    #[test]
    fn test_should_prefer_reference_traits_over_shape_traits() {
        let sqs = fixtures::sqs();
        let request = sqs.shape_by_name("SendMessageRequest").unwrap();
        let attributes = request.member("MessageAttributes").unwrap();

        assert_eq!(attributes.name(), "MessageBodyAttributeMap");
        assert_eq!(attributes.location_name(), Some("MessageAttribute"));
        assert!(attributes.is_flattened());
        assert_eq!(attributes.map_key().unwrap().location_name(), Some("Name"));
        assert_eq!(attributes.map_value().unwrap().location_name(), Some("Value"));
    }

    #[test]
    fn test_should_iterate_members_in_declaration_order() {
        let sqs = fixtures::sqs();
        let request = sqs.shape_by_name("SendMessageRequest").unwrap();
        let names: Vec<&str> = request.members().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            [
                "QueueUrl",
                "MessageBody",
                "DelaySeconds",
                "MessageAttributes",
                "MessageDeduplicationId",
                "MessageGroupId"
            ]
        );
    }

    #[test]
    fn test_should_expose_xml_attribute_and_namespace_traits() {
        let s3 = fixtures::s3();
        let grantee = s3.shape_by_name("Grantee").unwrap();
        let namespace = grantee.xml_namespace().unwrap();
        assert_eq!(namespace.attribute_name(), "xmlns:xsi");
        assert_eq!(namespace.uri, "http://www.w3.org/2001/XMLSchema-instance");

        let kind = grantee.member("Type").unwrap();
        assert!(kind.is_xml_attribute());
        assert_eq!(kind.location_name(), Some("xsi:type"));
    }

    #[test]
    fn test_should_expose_error_metadata() {
        let sqs = fixtures::sqs();
        let missing = sqs.shape_by_name("QueueDoesNotExist").unwrap();
        assert!(missing.is_exception());
        let error = missing.error().unwrap();
        assert_eq!(error.code.as_deref(), Some("AWS.SimpleQueueService.NonExistentQueue"));
        assert_eq!(error.http_status_code, Some(400));
        assert!(error.sender_fault);

        let plain = sqs.shape_by_name("InvalidAttributeName").unwrap();
        assert!(plain.is_exception());
        assert!(plain.error().is_none());
    }

    #[test]
    fn test_should_return_none_for_nested_accessors_on_scalars() {
        let sqs = fixtures::sqs();
        let string = sqs.shape_by_name("String").unwrap();
        assert!(string.shape_type().is_scalar());
        assert!(string.list_member().is_none());
        assert!(string.map_key().is_none());
        assert_eq!(string.members().count(), 0);
    }
}
