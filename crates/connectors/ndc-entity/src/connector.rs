//! The entry points of the connector.
//!
//! Configuration parsing, state initialization, query and explain are defined here.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info_span, Instrument};

use ndc_entity_configuration as configuration;

use super::error::{ConfigurationError, Error, InitializationError};
use super::executor::{Executor, QueryRequest, QueryResponse};
use super::state;

/// Validate the raw configuration provided by the user,
/// returning a configuration error or a validated `Configuration`.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path> + Send,
) -> Result<configuration::Configuration, ConfigurationError> {
    // Note that we don't log validation errors, because they are part of the normal business
    // operation of configuration validation, i.e. they don't represent an error condition that
    // signifies that anything has gone wrong with the connector process.
    let configuration_dir = configuration_dir.as_ref();
    let parsed_configuration = configuration::parse_configuration(configuration_dir)
        .instrument(info_span!("parse configuration"))
        .await?;

    Ok(configuration::make_runtime_configuration(
        parsed_configuration,
        configuration_dir,
    )?)
}

/// Initialize the connector's in-memory state.
///
/// This loads the entity store and registers the connector's metrics
/// with the metrics registry.
pub async fn try_init_state(
    configuration: &configuration::Configuration,
    metrics: &mut prometheus::Registry,
) -> Result<state::State, InitializationError> {
    state::create_state(configuration, metrics)
        .instrument(info_span!("Initialise state"))
        .await
        .map_err(|err| {
            tracing::error!(
                meta.signal_type = "log",
                event.domain = "ndc",
                event.name = "Initialization error",
                name = "Initialization error",
                body = %err,
                error = true,
            );
            err
        })
}

/// Execute a query
///
/// Each root field selects the instances of the entity it names. The data is an object
/// keyed by the response keys of the root fields. Fields that fail to resolve are null and
/// listed in the errors of the response.
pub fn query(
    configuration: &configuration::Configuration,
    state: &state::State,
    request: &QueryRequest,
) -> Result<QueryResponse, Error> {
    info_span!("Execute query").in_scope(|| {
        Executor::new(configuration, &state.metrics, &state.store)
            .execute(request)
            .map_err(|err| {
                tracing::error!(
                    meta.signal_type = "log",
                    event.domain = "ndc",
                    event.name = "Query error",
                    name = "Query error",
                    body = %err,
                    error = true,
                );
                err
            })
    })
}

/// Explain a query by creating the execution plan of each root field
pub fn explain(
    configuration: &configuration::Configuration,
    state: &state::State,
    request: &QueryRequest,
) -> Result<BTreeMap<String, String>, Error> {
    info_span!("Explain query").in_scope(|| {
        Executor::new(configuration, &state.metrics, &state.store)
            .explain(request)
            .map_err(|err| {
                tracing::error!(
                    meta.signal_type = "log",
                    event.domain = "ndc",
                    event.name = "Explain error",
                    name = "Explain error",
                    body = %err,
                    error = true,
                );
                err
            })
    })
}
