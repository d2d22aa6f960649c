//! Common functions used across test cases.

use tests_common::deployment::helpers::{create_starwars_deployment, Deployment};

/// Loads a fresh Star Wars deployment, with its own metrics.
pub async fn starwars() -> Deployment {
    create_starwars_deployment()
        .await
        .expect("unable to load the Star Wars deployment")
}

/// Runs a request against a fresh Star Wars deployment, expecting every field to resolve.
pub async fn run_query(request: serde_json::Value) -> serde_json::Value {
    let response = starwars()
        .await
        .query_json(request)
        .expect("query failed");
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data
}

/// A string argument.
pub fn string(value: &str) -> serde_json::Value {
    serde_json::json!({ "type": "string", "value": value })
}

/// An enum argument.
pub fn enum_value(value: &str) -> serde_json::Value {
    serde_json::json!({ "type": "enum", "value": value })
}

/// A variable reference.
pub fn variable(name: &str) -> serde_json::Value {
    serde_json::json!({ "type": "variable", "value": name })
}
