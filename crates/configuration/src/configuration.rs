//! Configuration for the connector.

use std::path::PathBuf;

use query_engine_metadata::metadata;
use schemars::schema::RootSchema;

use crate::values::FetchSettings;
use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to serve queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which also checks that the entity model is consistent.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
    pub fetch_settings: FetchSettings,
    /// Where the entity data is read from, resolved against the configuration directory.
    pub data_file: Option<PathBuf>,
}

/// The JSON schema of the configuration file.
pub fn generate_latest_schema() -> RootSchema {
    schemars::schema_for!(ParsedConfiguration)
}
