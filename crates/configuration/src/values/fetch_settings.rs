use query_engine_sql::sql::ast::JoinType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings controlling how selections become joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchSettings {
    /// Load to-one associations in the same query when their parent level is loaded
    /// and they carry no filter arguments.
    #[serde(default = "eager_fetch_to_one_default")]
    pub eager_fetch_to_one: bool,
    /// The join type used when a selection does not ask for one.
    #[serde(default = "default_join_type_default")]
    pub default_join_type: JoinType,
}

impl FetchSettings {
    pub fn is_default(&self) -> bool {
        *self == FetchSettings::default()
    }
}

impl Default for FetchSettings {
    fn default() -> FetchSettings {
        FetchSettings {
            eager_fetch_to_one: true,
            default_join_type: JoinType::Left,
        }
    }
}

// for serde default //
fn eager_fetch_to_one_default() -> bool {
    FetchSettings::default().eager_fetch_to_one
}
fn default_join_type_default() -> JoinType {
    FetchSettings::default().default_join_type
}
