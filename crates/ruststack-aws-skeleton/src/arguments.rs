//! Expanded handler arguments keyed by snake_case member name.

use ruststack_aws_model::{CommonServiceException, Params, ServiceException, Value};

use crate::naming::xform_name;

/// Input members of a request, renamed with [`xform_name`].
///
/// Members absent from the request are absent here; optional members are
/// read with the plain getters and required ones with `required_*`, which
/// fail with the common `MissingParameter` exception.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceArguments {
    values: Params,
}

impl ServiceArguments {
    /// Rename the members of a parsed request.
    #[must_use]
    pub fn from_params(params: Params) -> Self {
        Self {
            values: params
                .into_iter()
                .map(|(name, value)| (xform_name(&name), value))
                .collect(),
        }
    }

    /// Raw value of an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether the request carried the argument.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// A string argument.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// An integer or long argument.
    #[must_use]
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// A boolean argument.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// A list argument.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    /// A structure or map argument.
    #[must_use]
    pub fn map(&self, name: &str) -> Option<&Params> {
        self.get(name).and_then(Value::as_map)
    }

    /// Move an argument out.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// A required argument of any type.
    ///
    /// # Errors
    /// `MissingParameter` when the request did not carry it.
    pub fn required(&self, name: &str) -> Result<&Value, ServiceException> {
        self.get(name).ok_or_else(|| missing_parameter(name))
    }

    /// A required string argument.
    ///
    /// # Errors
    /// `MissingParameter` when the request did not carry it as a string.
    pub fn required_str(&self, name: &str) -> Result<&str, ServiceException> {
        self.str(name).ok_or_else(|| missing_parameter(name))
    }

    /// A required integer argument.
    ///
    /// # Errors
    /// `MissingParameter` when the request did not carry it as an integer.
    pub fn required_i64(&self, name: &str) -> Result<i64, ServiceException> {
        self.i64(name).ok_or_else(|| missing_parameter(name))
    }

    /// Number of arguments present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the request carried no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arguments in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn missing_parameter(name: &str) -> ServiceException {
    CommonServiceException::new(
        "MissingParameter",
        format!("The request must contain the parameter {name}."),
    )
    .with_sender_fault(true)
    .into()
}
