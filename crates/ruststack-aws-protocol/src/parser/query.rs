//! Query and EC2 request parsing.
//!
//! Both protocols send `application/x-www-form-urlencoded` parameters whose
//! keys spell out the path through the input shape:
//!
//! ```text
//! Action=SendMessage
//! QueueUrl=http://localhost:4566/000000000000/jobs
//! MessageAttribute.1.Name=color
//! MessageAttribute.1.Value.StringValue=blue
//! MessageAttribute.1.Value.DataType=String
//! ```
//!
//! Lists and maps are enumerated from index 1 upwards until the first
//! missing index.

use std::collections::HashMap;

use ruststack_aws_model::{
    OperationModel, Params, RawRequest, ServiceModel, ShapeType, ShapeView, Value,
};

use super::{join_key, text_scalar};
use crate::error::ParseError;
use crate::scalar::TimestampFormat;

/// Which naming rules apply to form keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryFlavor {
    /// `query`: `locationName` or member name, `member.` list infix.
    Query,
    /// `ec2`: `queryName`, else capitalized `locationName` or member name;
    /// lists never carry an infix.
    Ec2,
}

pub(crate) fn parse<'m>(
    service: &'m ServiceModel,
    flavor: QueryFlavor,
    max_entries: usize,
    request: &RawRequest,
) -> Result<(&'m OperationModel, Params), ParseError> {
    let encoded: &[u8] = if request.body.is_empty() {
        request.query_string().unwrap_or_default().as_bytes()
    } else {
        &request.body
    };

    let mut form = HashMap::new();
    for (key, value) in form_urlencoded::parse(encoded) {
        form.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }

    let action = form
        .get("Action")
        .ok_or_else(|| ParseError::MissingAction("request has no Action parameter".to_owned()))?;
    let operation = service.operation_by_name(action)?;

    let decoder = FormDecoder {
        form: &form,
        flavor,
        max_entries,
    };
    let params = match service.input_shape(operation) {
        Some(shape) => decoder.structure(shape, "")?.unwrap_or_default(),
        None => Params::new(),
    };
    Ok((operation, params))
}

struct FormDecoder<'f> {
    form: &'f HashMap<String, String>,
    flavor: QueryFlavor,
    max_entries: usize,
}

impl FormDecoder<'_> {
    fn value(&self, shape: ShapeView<'_>, key: &str) -> Result<Option<Value>, ParseError> {
        if let Some(location) = shape.location() {
            return Err(ParseError::NotImplemented(format!(
                "{location} binding of {key} in a form-encoded request"
            )));
        }
        match shape.shape_type() {
            ShapeType::Structure => Ok(self.structure(shape, key)?.map(Value::Map)),
            ShapeType::List => self.list(shape, key),
            ShapeType::Map => self.map(shape, key),
            _ => self.scalar(shape, key),
        }
    }

    fn structure(&self, shape: ShapeView<'_>, prefix: &str) -> Result<Option<Params>, ParseError> {
        let mut params = Params::new();
        for (name, member) in shape.members() {
            let key = join_key(prefix, &self.member_name(name, member));
            if let Some(value) = self.value(member, &key)? {
                params.insert(name.to_owned(), value);
            }
        }
        Ok((!params.is_empty()).then_some(params))
    }

    fn member_name(&self, name: &str, member: ShapeView<'_>) -> String {
        match self.flavor {
            QueryFlavor::Query => member.serialized_name(name).to_owned(),
            QueryFlavor::Ec2 => member.query_name().map_or_else(
                || capitalize(member.serialized_name(name)),
                str::to_owned,
            ),
        }
    }

    fn list(&self, shape: ShapeView<'_>, key: &str) -> Result<Option<Value>, ParseError> {
        let Some(member) = shape.list_member() else {
            return Ok(None);
        };
        if self.form.get(key).is_some_and(String::is_empty) {
            return Ok(Some(Value::List(Vec::new())));
        }

        let item_prefix = match self.flavor {
            QueryFlavor::Ec2 => key.to_owned(),
            QueryFlavor::Query if shape.is_flattened() => match member.location_name() {
                Some(name) => match key.rsplit_once('.') {
                    Some((parent, _)) => format!("{parent}.{name}"),
                    None => name.to_owned(),
                },
                None => key.to_owned(),
            },
            QueryFlavor::Query => format!("{key}.{}", member.serialized_name("member")),
        };

        let mut items = Vec::new();
        let mut index = 1;
        while let Some(item) = self.value(member, &format!("{item_prefix}.{index}"))? {
            self.check_bound(key, index)?;
            items.push(item);
            index += 1;
        }
        Ok((!items.is_empty()).then_some(Value::List(items)))
    }

    fn map(&self, shape: ShapeView<'_>, key: &str) -> Result<Option<Value>, ParseError> {
        let (Some(key_shape), Some(value_shape)) = (shape.map_key(), shape.map_value()) else {
            return Ok(None);
        };
        let entry_prefix = if shape.is_flattened() {
            key.to_owned()
        } else {
            format!("{key}.entry")
        };
        let key_name = key_shape.serialized_name("key");
        let value_name = value_shape.serialized_name("value");

        let mut entries = Params::new();
        let mut index = 1;
        while let Some(entry_key) = self.form.get(&format!("{entry_prefix}.{index}.{key_name}")) {
            self.check_bound(key, index)?;
            let value_key = format!("{entry_prefix}.{index}.{value_name}");
            let Some(value) = self.value(value_shape, &value_key)? else {
                break;
            };
            entries.insert(entry_key.clone(), value);
            index += 1;
        }
        Ok((!entries.is_empty()).then_some(Value::Map(entries)))
    }

    fn scalar(&self, shape: ShapeView<'_>, key: &str) -> Result<Option<Value>, ParseError> {
        self.form
            .get(key)
            .map(|text| {
                text_scalar(shape, text, TimestampFormat::Iso8601)
                    .map_err(|e| ParseError::scalar(key, e))
            })
            .transpose()
    }

    fn check_bound(&self, key: &str, index: usize) -> Result<(), ParseError> {
        if index > self.max_entries {
            return Err(ParseError::TooManyEntries {
                name: key.to_owned(),
                limit: self.max_entries,
            });
        }
        Ok(())
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
