//! Convert a query plan AST to a low-level query string.

use super::ast::*;
use super::helpers;
use super::string::*;

// Convert to SQL strings

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");
        if self.distinct {
            sql.append_syntax("DISTINCT ");
        }

        self.select_list.to_sql(sql);

        sql.append_syntax(" ");

        self.from.to_sql(sql);

        for join in &self.joins {
            join.to_sql(&self.from.alias, sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        self.entity.to_sql(sql);
        sql.append_syntax(" AS ");
        self.alias.to_sql(sql);
    }
}

impl Join {
    /// Render this join and the joins nested under it. `source` is the alias this join navigates from.
    pub fn to_sql(&self, source: &TableAlias, sql: &mut SQL) {
        self.join_type.to_sql(sql);
        if self.kind == JoinKind::Fetch {
            sql.append_syntax("FETCH ");
        }
        source.to_sql(sql);
        sql.append_syntax(".");
        sql.append_identifier(&self.attribute);
        sql.append_syntax(" AS ");
        self.alias.to_sql(sql);

        if let Some(on) = &self.on {
            sql.append_syntax(" ON ");
            on.to_sql(sql);
        }

        for join in &self.joins {
            join.to_sql(&self.alias, sql);
        }
    }
}

impl JoinType {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            JoinType::Inner => sql.append_syntax(" INNER JOIN "),
            JoinType::Left => sql.append_syntax(" LEFT OUTER JOIN "),
            JoinType::Right => sql.append_syntax(" RIGHT OUTER JOIN "),
        }
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::TableReference(alias) => alias.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperator {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryArrayOperator {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                {
                    left.to_sql(sql);
                    operator.to_sql(sql);
                    sql.append_syntax("(");
                    for (index, item) in right.iter().enumerate() {
                        item.to_sql(sql);
                        if index < (right.len() - 1) {
                            sql.append_syntax(", ");
                        }
                    }
                    sql.append_syntax(")");
                }
                sql.append_syntax(")");
            }
            Expression::InSubquery { left, select } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" IN (");
                select.to_sql(sql);
                sql.append_syntax("))");
            }
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
        }
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("true"),
            Value::Bool(false) => sql.append_syntax("false"),
            Value::Int8(i) => sql.append_syntax(format!("{i}").as_str()),
            Value::String(s) => sql.append_param(Param::String(s.clone())),
            Value::Float8(_) | Value::Uuid(_) | Value::Enum { .. } | Value::Entity(_) => {
                sql.append_param(Param::Value(self.clone()));
            }
            Value::Array(items) => {
                sql.append_syntax("ARRAY [");
                for (index, item) in items.iter().enumerate() {
                    item.to_sql(sql);
                    if index < (items.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax("]");
            }
        }
    }
}

// names
impl EntityName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        let name = format!("{}_{}", self.name, self.unique_index);
        sql.append_identifier(&name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.table.to_sql(sql);
        sql.append_syntax(".");
        sql.append_identifier(&self.attribute);
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, order_by_item) in self.elements.iter().enumerate() {
                order_by_item.to_sql(sql);
                if index < (self.elements.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}
