//! Execute an execution plan against a store.

use query_engine_sql::sql;

use crate::error::Error;
use crate::instance::Instance;

/// Something that can run a plan and hand back the root instances it selects.
pub trait QueryTransport {
    /// Run a plan. The instances come back distinct and in plan order, with the associations
    /// of every fetch join loaded on them.
    fn execute(&self, plan: &sql::execution_plan::ExecutionPlan) -> Result<Vec<Instance>, Error>;
}

/// Render a plan and pretty print it.
pub fn explain(plan: &sql::execution_plan::ExecutionPlan) -> String {
    let query = plan.query_sql();

    tracing::info!(
        entity = plan.root_entity,
        generated_sql = query.sql,
        params = ?&query.params,
    );

    sqlformat::format(
        &query.sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}
