//! XML body decoding for REST-XML requests.

use ruststack_aws_model::{Params, ShapeType, ShapeView, Value};

use super::{join_key, text_scalar};
use crate::error::ParseError;
use crate::scalar::TimestampFormat;
use crate::xml::XmlElement;

/// Parse a body and read its root element as a structure of `shape`.
pub(crate) fn decode_document(
    shape: ShapeView<'_>,
    body: &[u8],
    skip_locations: bool,
) -> Result<Params, ParseError> {
    let root = XmlElement::parse(body)?;
    decode_structure(shape, &root, "", skip_locations)
}

fn decode_structure(
    shape: ShapeView<'_>,
    element: &XmlElement,
    path: &str,
    skip_locations: bool,
) -> Result<Params, ParseError> {
    let mut params = Params::new();
    for (name, member) in shape.members() {
        if let Some(location) = member.location() {
            if skip_locations {
                continue;
            }
            return Err(ParseError::NotImplemented(format!(
                "{location} binding of {name} in an XML body"
            )));
        }
        let wire = member.serialized_name(name);
        let member_path = join_key(path, wire);

        let value = if member.is_xml_attribute() {
            element
                .attribute(wire)
                .map(|text| scalar(member, text, &member_path))
                .transpose()?
        } else if member.is_flattened() && member.shape_type() == ShapeType::List {
            flattened_list(member, element, wire, &member_path)?
        } else if member.is_flattened() && member.shape_type() == ShapeType::Map {
            let entries: Vec<&XmlElement> = element.children_named(wire).collect();
            if entries.is_empty() {
                None
            } else {
                Some(map_entries(member, entries, &member_path)?)
            }
        } else {
            element
                .child(wire)
                .map(|child| decode_value(member, child, &member_path))
                .transpose()?
        };

        if let Some(value) = value {
            params.insert(name.to_owned(), value);
        }
    }
    Ok(params)
}

fn flattened_list(
    shape: ShapeView<'_>,
    parent: &XmlElement,
    wire: &str,
    path: &str,
) -> Result<Option<Value>, ParseError> {
    let Some(member) = shape.list_member() else {
        return Ok(None);
    };
    let item_name = member.location_name().unwrap_or(wire);
    let items = parent
        .children_named(item_name)
        .enumerate()
        .map(|(index, child)| decode_value(member, child, &format!("{path}.{}", index + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((!items.is_empty()).then_some(Value::List(items)))
}

fn decode_value(
    shape: ShapeView<'_>,
    element: &XmlElement,
    path: &str,
) -> Result<Value, ParseError> {
    match shape.shape_type() {
        ShapeType::Structure => Ok(Value::Map(decode_structure(shape, element, path, false)?)),
        ShapeType::List => {
            let Some(member) = shape.list_member() else {
                return Ok(Value::List(Vec::new()));
            };
            let item_name = member.serialized_name("member");
            element
                .children_named(item_name)
                .enumerate()
                .map(|(index, child)| {
                    decode_value(member, child, &format!("{path}.{}", index + 1))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        ShapeType::Map => map_entries(shape, element.children_named("entry").collect(), path),
        _ => scalar(shape, &element.text, path),
    }
}

fn map_entries(
    shape: ShapeView<'_>,
    entries: Vec<&XmlElement>,
    path: &str,
) -> Result<Value, ParseError> {
    let (Some(key_shape), Some(value_shape)) = (shape.map_key(), shape.map_value()) else {
        return Ok(Value::Map(Params::new()));
    };
    let key_name = key_shape.serialized_name("key");
    let value_name = value_shape.serialized_name("value");

    let mut map = Params::new();
    for entry in entries {
        let Some(key) = entry.child(key_name) else {
            continue;
        };
        let value = match entry.child(value_name) {
            Some(value) => decode_value(value_shape, value, &join_key(path, &key.text))?,
            None => continue,
        };
        map.insert(key.text.clone(), value);
    }
    Ok(Value::Map(map))
}

fn scalar(shape: ShapeView<'_>, text: &str, path: &str) -> Result<Value, ParseError> {
    text_scalar(shape, text, TimestampFormat::Iso8601).map_err(|e| ParseError::scalar(path, e))
}

#[cfg(test)]
mod tests {
    use ruststack_aws_model::fixtures;

    use super::*;

    #[test]
    fn test_should_decode_nested_structure_with_namespace() {
        let route53 = fixtures::route53();
        let input = route53.shape_by_name("CreateHostedZoneRequest").unwrap();
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
            <CreateHostedZoneRequest xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
              <Name>example.com.</Name>
              <CallerReference>ref-1</CallerReference>
              <HostedZoneConfig>
                <Comment>internal</Comment>
                <PrivateZone>true</PrivateZone>
              </HostedZoneConfig>
            </CreateHostedZoneRequest>"#;

        let params = decode_document(input, body, true).unwrap();
        assert_eq!(params["Name"], Value::from("example.com."));
        assert_eq!(
            params["HostedZoneConfig"],
            Value::map([
                ("Comment", Value::from("internal")),
                ("PrivateZone", Value::from(true)),
            ])
        );
        assert!(!params.contains_key("VPC"));
    }

    #[test]
    fn test_should_decode_wrapped_lists_with_member_names() {
        let s3 = fixtures::s3();
        let tagging = s3.shape_by_name("Tagging").unwrap();
        let body = br"<Tagging><TagSet>
            <Tag><Key>env</Key><Value>prod</Value></Tag>
            <Tag><Key>team</Key><Value>data</Value></Tag>
        </TagSet></Tagging>";

        let params = decode_document(tagging, body, false).unwrap();
        assert_eq!(
            params["TagSet"],
            Value::list([
                Value::map([("Key", "env"), ("Value", "prod")]),
                Value::map([("Key", "team"), ("Value", "data")]),
            ])
        );
    }

    #[test]
    fn test_should_read_xml_attributes() {
        let s3 = fixtures::s3();
        let grantee = s3.shape_by_name("Grantee").unwrap();
        let body = br#"<Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="CanonicalUser"><ID>owner</ID></Grantee>"#;

        let params = decode_document(grantee, body, false).unwrap();
        assert_eq!(params["Type"], Value::from("CanonicalUser"));
        assert_eq!(params["ID"], Value::from("owner"));
    }

    #[test]
    fn test_should_report_invalid_scalar_path() {
        let route53 = fixtures::route53();
        let input = route53.shape_by_name("CreateHostedZoneRequest").unwrap();
        let body = br"<CreateHostedZoneRequest><HostedZoneConfig><PrivateZone>maybe</PrivateZone></HostedZoneConfig></CreateHostedZoneRequest>";

        let err = decode_document(input, body, true).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidScalar { member, .. } if member == "HostedZoneConfig.PrivateZone"
        ));
    }

    #[test]
    fn test_should_reject_malformed_xml() {
        let s3 = fixtures::s3();
        let tagging = s3.shape_by_name("Tagging").unwrap();
        assert!(matches!(
            decode_document(tagging, b"<Tagging><TagSet>", false),
            Err(ParseError::MalformedRequestBody(_))
        ));
    }
}
