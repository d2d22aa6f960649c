//! The selection tree handed to the translator by the query front end.

use enum_iterator::all;
use serde::{Deserialize, Serialize};

use query_engine_sql::sql;

use super::error::CoercionError;

/// Reserved argument selecting the ordering direction of a scalar field.
pub const ORDER_BY_ARGUMENT: &str = "orderBy";
/// Reserved argument selecting the join type of an association.
pub const JOIN_TYPE_ARGUMENT: &str = "joinType";
/// The introspection meta-field naming the entity type of an object.
pub const TYPENAME_FIELD: &str = "__typename";

/// A field in the request, with its arguments and sub-selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<SelectionNode>,
}

/// A named argument of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

/// An argument value as written in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Variable(String),
}

impl SelectionNode {
    pub fn field(name: &str) -> SelectionNode {
        SelectionNode {
            name: name.to_string(),
            alias: None,
            arguments: vec![],
            selections: vec![],
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: &str, value: Value) -> SelectionNode {
        self.arguments.push(Argument {
            name: name.to_string(),
            value,
        });
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: SelectionNode) -> SelectionNode {
        self.selections.push(selection);
        self
    }

    /// The key this field's value is reported under.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_typename(&self) -> bool {
        self.name == TYPENAME_FIELD
    }

    pub fn has_selections(&self) -> bool {
        !self.selections.is_empty()
    }

    /// Sub-selections that name attributes of the entity.
    pub fn attribute_selections(&self) -> impl Iterator<Item = &SelectionNode> {
        self.selections.iter().filter(|s| !s.is_typename())
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    /// Arguments which constrain the selected values. Reserved arguments are excluded.
    pub fn filter_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(|argument| argument.name != ORDER_BY_ARGUMENT && argument.name != JOIN_TYPE_ARGUMENT)
    }

    pub fn has_filter_arguments(&self) -> bool {
        self.filter_arguments().next().is_some()
    }

    /// The requested ordering direction, if any.
    pub fn order_direction(&self) -> Result<Option<sql::ast::OrderByDirection>, CoercionError> {
        self.argument(ORDER_BY_ARGUMENT)
            .map(|value| match directive_name(value) {
                Some("ASC") => Ok(sql::ast::OrderByDirection::Asc),
                Some("DESC") => Ok(sql::ast::OrderByDirection::Desc),
                _ => Err(CoercionError::InvalidDirective {
                    argument: ORDER_BY_ARGUMENT.to_string(),
                    value: format!("{value:?}"),
                    expected: "ASC, DESC".to_string(),
                }),
            })
            .transpose()
    }

    /// The requested join type, if any.
    pub fn join_type(&self) -> Result<Option<sql::ast::JoinType>, CoercionError> {
        self.argument(JOIN_TYPE_ARGUMENT)
            .map(|value| {
                let requested = directive_name(value);
                all::<sql::ast::JoinType>()
                    .find(|join_type| requested == Some(join_type.to_string().as_str()))
                    .ok_or_else(|| CoercionError::InvalidDirective {
                        argument: JOIN_TYPE_ARGUMENT.to_string(),
                        value: format!("{value:?}"),
                        expected: all::<sql::ast::JoinType>()
                            .map(|join_type| join_type.to_string())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            })
            .transpose()
    }
}

fn directive_name(value: &Value) -> Option<&str> {
    match value {
        Value::Enum(name) => Some(name.as_str()),
        _ => None,
    }
}
