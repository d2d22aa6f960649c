//! The version 1 configuration format: the entity model, fetch settings and where the data lives.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::FetchSettings;

pub(crate) const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as it is stored on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    // Which version of the configuration format are we using
    pub version: u32,
    #[serde(default)]
    pub metadata: metadata::Metadata,
    #[serde(default, skip_serializing_if = "FetchSettings::is_default")]
    pub fetch_settings: FetchSettings,
    /// The entity data to serve, relative to the configuration directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            metadata: metadata::Metadata::empty(),
            fetch_settings: FetchSettings::default(),
            data_file: None,
        }
    }
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parse_error = |error: serde_json::Error| ParseConfigurationError::ParseError {
        file_path: configuration_file.clone(),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    };

    let untyped: serde_json::Value =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;

    match untyped.get("version") {
        None => {
            return Err(ParseConfigurationError::DidNotFindExpectedVersionTag(
                configuration_file.clone(),
            ))
        }
        Some(version) if *version != serde_json::Value::from(CURRENT_VERSION) => {
            return Err(ParseConfigurationError::UnsupportedVersion {
                file_path: configuration_file.clone(),
                found: version.clone(),
                expected: CURRENT_VERSION,
            })
        }
        Some(_) => {}
    }

    let parsed_config: ParsedConfiguration =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;

    tracing::debug!(
        entities = parsed_config.metadata.entities.0.len(),
        enum_types = parsed_config.metadata.enum_types.0.len(),
        "Parsed configuration"
    );

    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = crate::configuration::generate_latest_schema();
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_configuration(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIGURATION_FILENAME), contents)
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn written_configuration_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut parsed = ParsedConfiguration::initial();
        parsed.data_file = Some(PathBuf::from("data.json"));
        parsed.fetch_settings.eager_fetch_to_one = false;

        write_parsed_configuration(parsed.clone(), dir.path())
            .await
            .unwrap();

        assert!(dir.path().join(CONFIGURATION_JSONSCHEMA_FILENAME).exists());
        assert_eq!(parse_configuration(dir.path()).await.unwrap(), parsed);
    }

    #[tokio::test]
    async fn missing_version_is_rejected() {
        let dir = write_configuration(r#"{ "metadata": { "entities": {} } }"#).await;
        let error = parse_configuration(dir.path()).await.unwrap_err();
        assert!(matches!(
            error,
            ParseConfigurationError::DidNotFindExpectedVersionTag(_)
        ));
    }

    #[tokio::test]
    async fn other_versions_are_rejected() {
        let dir = write_configuration(r#"{ "version": 2 }"#).await;
        let error = parse_configuration(dir.path()).await.unwrap_err();
        assert!(matches!(
            error,
            ParseConfigurationError::UnsupportedVersion { expected: 1, .. }
        ));
    }

    #[tokio::test]
    async fn syntax_errors_carry_their_location() {
        let dir = write_configuration("{\n  \"version\": 1,\n  \"metadata\": [\n}").await;
        let error = parse_configuration(dir.path()).await.unwrap_err();
        match error {
            ParseConfigurationError::ParseError { line, .. } => assert_eq!(line, 4),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_settings_default_when_absent() {
        let dir = write_configuration(r#"{ "version": 1 }"#).await;
        let parsed = parse_configuration(dir.path()).await.unwrap();
        assert_eq!(parsed.fetch_settings, FetchSettings::default());
        assert_eq!(parsed.data_file, None);
    }
}
