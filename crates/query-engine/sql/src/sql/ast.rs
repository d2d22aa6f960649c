//! Type definitions of a relational query plan over entities.
//!
//! Joins navigate entity attributes rather than foreign keys, so a join only names
//! the attribute it follows. The source of a join is the alias of the enclosing
//! level: the root `FROM` for top-level joins, the parent join for nested ones.

use std::fmt;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    /// The alias whose bindings are projected.
    pub select_list: TableAlias,
    pub from: From,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub order_by: OrderBy,
}

/// The entity a query ranges over.
#[derive(Debug, Clone, PartialEq)]
pub struct From {
    pub entity: EntityName,
    pub alias: TableAlias,
}

/// A join following an attribute of the enclosing level.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub attribute: String,
    pub alias: TableAlias,
    pub kind: JoinKind,
    pub join_type: JoinType,
    pub on: Option<Expression>,
    /// Joins from this join's alias.
    pub joins: Vec<Join>,
}

/// Whether a join materializes the association on the parent instances
/// or only makes the target available to filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Join,
    Fetch,
}

/// The type of a join.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
        }
    }
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two expressions
    BinaryOperator {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A binary operation on an expression and a list of expressions
    BinaryArrayOperator {
        left: Box<Expression>,
        operator: BinaryArrayOperator,
        right: Vec<Expression>,
    },
    /// Membership of an expression in the projection of a subquery
    InSubquery {
        left: Box<Expression>,
        select: Box<Select>,
    },
    /// An attribute of the binding of an alias
    ColumnReference(ColumnReference),
    /// The binding of an alias itself: an entity instance or a collection element
    TableReference(TableAlias),
    /// A value
    Value(Value),
}

/// An operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
}

/// A binary operator for when the rhs is an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryArrayOperator {
    In,
}

/// A value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i64),
    Float8(f64),
    String(String),
    Uuid(uuid::Uuid),
    Enum { enum_type: String, constant: String },
    Array(Vec<Value>),
    /// A reference to a persisted entity instance
    Entity(EntityRef),
}

/// Identifies a persisted entity instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub entity: String,
    /// The canonical textual form of the instance's id.
    pub id: String,
}

/// The name of an entity type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName(pub String);

/// A reference to an attribute of an aliased binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub table: TableAlias,
    pub attribute: String,
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub unique_index: u64,
    pub name: String,
}
