//! Deployment functions used across test cases.

pub mod helpers {
    use std::path::PathBuf;

    use ndc_entity::connector;
    use ndc_entity::executor::{QueryRequest, QueryResponse};
    use ndc_entity::state::State;
    use ndc_entity_configuration::Configuration;

    /// The configuration directory of the Star Wars model and its data.
    pub const STARWARS_DEPLOYMENT_PATH: &str = "static/starwars";

    /// Find the project root via the crate root provided by `cargo test`,
    /// and get a path relative to it.
    /// This depends on the convention that all our test crates live in `/crates/tests/<name>`
    /// and will break in the unlikely case that we change this
    pub fn get_path_from_project_root(deployment_path: impl AsRef<std::path::Path>) -> PathBuf {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push("../../../");
        d.push(deployment_path);
        d
    }

    /// A configuration and a freshly initialised state, with the metrics registry they report to.
    pub struct Deployment {
        pub configuration: Configuration,
        pub state: State,
        pub metrics: prometheus::Registry,
    }

    impl Deployment {
        /// Run a request against this deployment.
        pub fn query(
            &self,
            request: &QueryRequest,
        ) -> Result<QueryResponse, ndc_entity::error::Error> {
            connector::query(&self.configuration, &self.state, request)
        }

        /// Run a request given as JSON against this deployment.
        pub fn query_json(
            &self,
            request: serde_json::Value,
        ) -> Result<QueryResponse, ndc_entity::error::Error> {
            let request: QueryRequest =
                serde_json::from_value(request).expect("request is not a valid QueryRequest");
            self.query(&request)
        }
    }

    /// Load the Star Wars deployment.
    pub async fn create_starwars_deployment() -> anyhow::Result<Deployment> {
        create_deployment(STARWARS_DEPLOYMENT_PATH).await
    }

    /// Load a deployment from a configuration directory relative to the project root.
    pub async fn create_deployment(deployment_path: &str) -> anyhow::Result<Deployment> {
        let _ = env_logger::builder().is_test(true).try_init();

        let configuration =
            connector::parse_configuration(get_path_from_project_root(deployment_path)).await?;
        let mut metrics = prometheus::Registry::new();
        let state = connector::try_init_state(&configuration, &mut metrics).await?;

        Ok(Deployment {
            configuration,
            state,
            metrics,
        })
    }
}
