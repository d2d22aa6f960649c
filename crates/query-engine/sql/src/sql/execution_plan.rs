//! Describe the query plan handed to a transport for execution.

use super::ast;
use super::string;

/// Definition of a query plan to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// The entity type of the returned instances.
    pub root_entity: String,
    /// The query.
    pub query: ast::Select,
}

impl ExecutionPlan {
    pub fn new(root_entity: &str, query: ast::Select) -> ExecutionPlan {
        ExecutionPlan {
            root_entity: root_entity.to_string(),
            query,
        }
    }

    /// Extract the query component as SQL.
    pub fn query_sql(&self) -> string::SQL {
        select_to_sql(&self.query)
    }
}

pub fn select_to_sql(select: &ast::Select) -> string::SQL {
    let mut sql = string::SQL::new();
    select.to_sql(&mut sql);
    sql
}
