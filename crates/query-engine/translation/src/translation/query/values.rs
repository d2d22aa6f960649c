//! Handle the translation of literal values.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::{AttributeDescriptor, ScalarType};
use query_engine_sql::sql;

use crate::translation::error::{CoercionError, Error, ModelResolutionError};
use crate::translation::helpers::{Env, RequestContext};
use crate::translation::request;

/// Where an argument's value is being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentScope<'a> {
    /// The entity whose attribute the argument names.
    pub entity: &'a str,
    /// Pre-coerced values of the field's arguments. Only the root field has them.
    pub bound_arguments: Option<&'a BTreeMap<String, sql::ast::Value>>,
}

/// Coerce the value of a filter argument into a typed value.
pub fn translate_argument_value(
    env: &Env,
    context: &RequestContext,
    scope: ArgumentScope,
    argument: &request::Argument,
) -> Result<sql::ast::Value, Error> {
    translate_value(env, context, scope, &argument.name, &argument.value)
}

fn translate_value(
    env: &Env,
    context: &RequestContext,
    scope: ArgumentScope,
    argument_name: &str,
    value: &request::Value,
) -> Result<sql::ast::Value, Error> {
    match value {
        request::Value::String(string) => {
            if let Some(bound @ sql::ast::Value::Uuid(_)) = scope
                .bound_arguments
                .and_then(|arguments| arguments.get(argument_name))
            {
                return Ok(bound.clone());
            }
            coerce_to_attribute(
                env,
                scope.entity,
                argument_name,
                sql::ast::Value::String(string.clone()),
            )
        }
        request::Value::Variable(name) => {
            let bound = context
                .variables
                .get(name)
                .ok_or_else(|| CoercionError::UnboundVariable(name.clone()))?;
            coerce_to_attribute(env, scope.entity, argument_name, bound.clone())
        }
        request::Value::List(items) => items
            .iter()
            .map(|item| translate_value(env, context, scope, argument_name, item))
            .collect::<Result<Vec<_>, Error>>()
            .map(sql::ast::Value::Array),
        request::Value::Enum(constant) => {
            translate_enum_value(env, scope.entity, argument_name, constant)
        }
        request::Value::Int(int) => Ok(sql::ast::Value::Int8(*int)),
        request::Value::Float(float) => Ok(sql::ast::Value::Float8(*float)),
        request::Value::Boolean(boolean) => Ok(sql::ast::Value::Bool(*boolean)),
        request::Value::Null => Ok(sql::ast::Value::Null),
    }
}

/// Resolve an enum literal against the enum type of the attribute the argument names.
fn translate_enum_value(
    env: &Env,
    entity: &str,
    argument_name: &str,
    constant: &str,
) -> Result<sql::ast::Value, Error> {
    let attribute = env.lookup_attribute(entity, argument_name).map_err(|_| {
        CoercionError::EnumAttributeNotFound {
            entity: entity.to_string(),
            argument: argument_name.to_string(),
        }
    })?;

    let enum_type = attribute
        .attribute_type()
        .enum_type()
        .ok_or_else(|| CoercionError::NotAnEnum {
            entity: entity.to_string(),
            attribute: argument_name.to_string(),
        })?;

    let enum_info = env.lookup_enum_type(enum_type)?;
    if !enum_info.contains(constant) {
        return Err(CoercionError::UnknownEnumConstant {
            enum_type: enum_type.to_string(),
            constant: constant.to_string(),
        }
        .into());
    }

    Ok(sql::ast::Value::Enum {
        enum_type: enum_type.to_string(),
        constant: constant.to_string(),
    })
}

/// Strings compared against uuid attributes become uuids. Anything else is left as is.
fn coerce_to_attribute(
    env: &Env,
    entity: &str,
    argument_name: &str,
    value: sql::ast::Value,
) -> Result<sql::ast::Value, Error> {
    match env.lookup_attribute(entity, argument_name) {
        Ok(attribute) => coerce_to_scalar_type(&attribute, argument_name, value),
        // the attribute is reported missing when the predicate is built
        Err(Error::ModelResolution(ModelResolutionError::AttributeNotFound { .. })) => Ok(value),
        Err(error) => Err(error),
    }
}

fn coerce_to_scalar_type(
    attribute: &AttributeDescriptor,
    argument_name: &str,
    value: sql::ast::Value,
) -> Result<sql::ast::Value, Error> {
    match (value, attribute.attribute_type().scalar_type()) {
        (sql::ast::Value::String(string), Some(ScalarType::Uuid)) => uuid::Uuid::parse_str(&string)
            .map(sql::ast::Value::Uuid)
            .map_err(|_| {
                CoercionError::InvalidUuid {
                    argument: argument_name.to_string(),
                    value: string.clone(),
                }
                .into()
            }),
        (sql::ast::Value::Array(items), _) => items
            .into_iter()
            .map(|item| coerce_to_scalar_type(attribute, argument_name, item))
            .collect::<Result<Vec<_>, Error>>()
            .map(sql::ast::Value::Array),
        (value, _) => Ok(value),
    }
}

/// Convert a JSON value, such as a request variable, into an untyped value.
pub fn translate_json_value(value: &serde_json::Value) -> Result<sql::ast::Value, Error> {
    match value {
        serde_json::Value::Null => Ok(sql::ast::Value::Null),
        serde_json::Value::Bool(b) => Ok(sql::ast::Value::Bool(*b)),
        serde_json::Value::Number(num) => match (num.as_i64(), num.as_f64()) {
            (Some(int), _) => Ok(sql::ast::Value::Int8(int)),
            (None, Some(float)) => Ok(sql::ast::Value::Float8(float)),
            (None, None) => Err(CoercionError::UnsupportedJsonValue(value.clone()).into()),
        },
        serde_json::Value::String(s) => Ok(sql::ast::Value::String(s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(translate_json_value)
            .collect::<Result<Vec<_>, Error>>()
            .map(sql::ast::Value::Array),
        serde_json::Value::Object(_) => {
            Err(CoercionError::UnsupportedJsonValue(value.clone()).into())
        }
    }
}
