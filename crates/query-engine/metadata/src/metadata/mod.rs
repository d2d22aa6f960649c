//! Metadata information regarding the entity model.

pub mod database;
pub mod model;

// re-export without modules
pub use database::*;
pub use model::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub entities: EntitiesInfo,
    #[serde(default)]
    pub enum_types: EnumTypes,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            entities: EntitiesInfo::empty(),
            enum_types: EnumTypes::empty(),
        }
    }
}
