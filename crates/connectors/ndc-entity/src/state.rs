//! Transient state used by the connector.
//!
//! This is initialized on startup.

use tracing::{info_span, Instrument};

use ndc_entity_configuration::Configuration;
use query_engine_execution::metrics;
use query_engine_execution::store::MemoryStore;

use crate::error::InitializationError;

/// State for our connector.
#[derive(Debug)]
pub struct State {
    pub metrics: metrics::Metrics,
    pub store: MemoryStore,
}

/// Load the entity store and wrap it inside a connector State.
pub async fn create_state(
    configuration: &Configuration,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let metrics = async {
        let metrics_inner = metrics::Metrics::initialize(metrics_registry)
            .map_err(InitializationError::MetricsError)?;
        Ok(metrics_inner)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    let store = async {
        match &configuration.data_file {
            None => Ok(MemoryStore::empty(configuration.metadata.clone())),
            Some(file_path) => {
                let data = tokio::fs::read_to_string(file_path).await.map_err(|error| {
                    InitializationError::DataFile {
                        file_path: file_path.clone(),
                        error,
                    }
                })?;
                MemoryStore::from_json(configuration.metadata.clone(), &data)
                    .map_err(InitializationError::Store)
            }
        }
    }
    .instrument(info_span!("Load entity store"))
    .await?;

    Ok(State { metrics, store })
}
