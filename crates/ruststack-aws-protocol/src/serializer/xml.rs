//! XML bodies for the Query, EC2 and REST-XML protocols.

use bytes::Bytes;
use ruststack_aws_model::{OperationModel, Params, ServiceModel, ShapeType, ShapeView, Value};

use super::{
    BodyCodec, ErrorDetails, SerializationContext, check_members, mismatch, scalar_text,
};
use crate::error::SerializeError;
use crate::scalar::TimestampFormat;
use crate::xml::XmlElement;

/// Outer structure of XML responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEnvelope {
    /// `<OpResponse><OpResult/><ResponseMetadata/></OpResponse>`.
    Query,
    /// `<OpResponse>` holding the result members and `<requestId>`.
    Ec2,
    /// The result structure is the document root.
    Bare,
}

/// Writes XML result and error documents.
#[derive(Debug, Clone, Copy)]
pub struct XmlBodyCodec {
    envelope: XmlEnvelope,
}

impl XmlBodyCodec {
    /// A codec for the given envelope.
    #[must_use]
    pub fn new(envelope: XmlEnvelope) -> Self {
        Self { envelope }
    }
}

impl BodyCodec for XmlBodyCodec {
    fn content_type(&self, _service: &ServiceModel) -> String {
        match self.envelope {
            XmlEnvelope::Query | XmlEnvelope::Ec2 => "text/xml".to_owned(),
            XmlEnvelope::Bare => "application/xml".to_owned(),
        }
    }

    fn serialize_result(
        &self,
        ctx: &SerializationContext<'_>,
        operation: &OperationModel,
        shape: Option<ShapeView<'_>>,
        params: &Params,
    ) -> Result<Bytes, SerializeError> {
        let mut root = match self.envelope {
            XmlEnvelope::Query => {
                let mut root = response_root(ctx, operation);
                if let Some(shape) = shape {
                    let name = shape
                        .result_wrapper()
                        .map_or_else(|| format!("{}Result", operation.name()), str::to_owned);
                    let mut result = XmlElement::new(name);
                    write_members(&mut result, shape, params)?;
                    root.push(result);
                }
                let mut metadata = XmlElement::new("ResponseMetadata");
                metadata.push(XmlElement::with_text("RequestId", ctx.request_id));
                root.push(metadata);
                root
            }
            XmlEnvelope::Ec2 => {
                let mut root = response_root(ctx, operation);
                if let Some(shape) = shape {
                    write_members(&mut root, shape, params)?;
                }
                root.push(XmlElement::with_text("requestId", ctx.request_id));
                root
            }
            XmlEnvelope::Bare => {
                let Some(shape) = shape else {
                    return Ok(Bytes::new());
                };
                check_members(shape, params)?;
                let has_body = shape
                    .members()
                    .any(|(name, member)| member.location().is_none() && params.contains_key(name));
                if !has_body {
                    return Ok(Bytes::new());
                }
                let mut root = XmlElement::new(shape.location_name().unwrap_or(shape.name()));
                match shape.xml_namespace() {
                    Some(ns) => root.set_attribute(ns.attribute_name(), ns.uri.as_str()),
                    None => {
                        if let Some(ns) = &ctx.service.metadata().xml_namespace {
                            root.set_attribute("xmlns", ns.as_str());
                        }
                    }
                }
                write_members(&mut root, shape, params)?;
                root
            }
        };
        Ok(Bytes::from(root.to_document()?))
    }

    fn serialize_error(
        &self,
        ctx: &SerializationContext<'_>,
        error: &ErrorDetails<'_>,
    ) -> Result<Bytes, SerializeError> {
        let s3 = ctx.service.metadata().endpoint_prefix == "s3";
        let mut element = XmlElement::new("Error");
        if error.sender_fault && self.envelope != XmlEnvelope::Ec2 && !s3 {
            element.push(XmlElement::with_text("Type", "Sender"));
        }
        element.push(XmlElement::with_text("Code", error.code.as_str()));
        element.push(XmlElement::with_text("Message", error.message));
        if let (Some(shape), Some(fields)) = (error.shape, error.fields) {
            write_members(&mut element, shape, fields)?;
        }

        let mut root = match self.envelope {
            XmlEnvelope::Ec2 => {
                let mut errors = XmlElement::new("Errors");
                errors.push(element);
                let mut root = XmlElement::new("Response");
                root.push(errors);
                root.push(XmlElement::with_text("RequestID", ctx.request_id));
                root
            }
            XmlEnvelope::Bare if s3 => {
                element.push(XmlElement::with_text("RequestId", ctx.request_id));
                element
            }
            XmlEnvelope::Query | XmlEnvelope::Bare => {
                let mut root = XmlElement::new("ErrorResponse");
                root.push(element);
                root.push(XmlElement::with_text("RequestId", ctx.request_id));
                root
            }
        };
        if let Some(ns) = &ctx.service.metadata().xml_namespace {
            root.set_attribute("xmlns", ns.as_str());
        }
        Ok(Bytes::from(root.to_document()?))
    }
}

fn response_root(ctx: &SerializationContext<'_>, operation: &OperationModel) -> XmlElement {
    let mut root = XmlElement::new(format!("{}Response", operation.name()));
    if let Some(ns) = &ctx.service.metadata().xml_namespace {
        root.set_attribute("xmlns", ns.as_str());
    }
    root
}

/// Write the members of a structure value into `element`: attributes for
/// `xmlAttribute` members, child elements for the rest.
fn write_members(
    element: &mut XmlElement,
    shape: ShapeView<'_>,
    params: &Params,
) -> Result<(), SerializeError> {
    check_members(shape, params)?;
    for (name, member) in shape.members() {
        if member.location().is_some() {
            continue;
        }
        let Some(value) = params.get(name) else {
            continue;
        };
        let wire = member.serialized_name(name);

        if member.is_xml_attribute() {
            element.set_attribute(wire, scalar_text(member, value, TimestampFormat::Iso8601)?);
            continue;
        }
        match member.shape_type() {
            ShapeType::List if member.is_flattened() => {
                let items = value.as_list().ok_or_else(|| mismatch(member, value))?;
                let Some(item_shape) = member.list_member() else {
                    continue;
                };
                let item_name = item_shape.location_name().unwrap_or(wire);
                for item in items {
                    element.push(to_element(item_shape, item_name, item)?);
                }
            }
            ShapeType::Map if member.is_flattened() => {
                let entries = value.as_map().ok_or_else(|| mismatch(member, value))?;
                for (key, item) in entries {
                    element.push(map_entry(member, wire, key, item)?);
                }
            }
            _ => element.push(to_element(member, wire, value)?),
        }
    }
    Ok(())
}

fn to_element(shape: ShapeView<'_>, name: &str, value: &Value) -> Result<XmlElement, SerializeError> {
    let mut element = XmlElement::new(name);
    if let Some(ns) = shape.xml_namespace() {
        element.set_attribute(ns.attribute_name(), ns.uri.as_str());
    }

    match shape.shape_type() {
        ShapeType::Structure => {
            let params = value.as_map().ok_or_else(|| mismatch(shape, value))?;
            write_members(&mut element, shape, params)?;
        }
        ShapeType::List => {
            let items = value.as_list().ok_or_else(|| mismatch(shape, value))?;
            if let Some(item_shape) = shape.list_member() {
                let item_name = item_shape.serialized_name("member");
                for item in items {
                    element.push(to_element(item_shape, item_name, item)?);
                }
            }
        }
        ShapeType::Map => {
            let entries = value.as_map().ok_or_else(|| mismatch(shape, value))?;
            for (key, item) in entries {
                element.push(map_entry(shape, "entry", key, item)?);
            }
        }
        _ => element.text = scalar_text(shape, value, TimestampFormat::Iso8601)?,
    }
    Ok(element)
}

fn map_entry(
    shape: ShapeView<'_>,
    entry_name: &str,
    key: &str,
    value: &Value,
) -> Result<XmlElement, SerializeError> {
    let mut entry = XmlElement::new(entry_name);
    if let (Some(key_shape), Some(value_shape)) = (shape.map_key(), shape.map_value()) {
        entry.push(XmlElement::with_text(key_shape.serialized_name("key"), key));
        entry.push(to_element(value_shape, value_shape.serialized_name("value"), value)?);
    }
    Ok(entry)
}
