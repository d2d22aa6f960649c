//! Convert the parsed configuration metadata to internal engine metadata
//! That can be used by the connector at runtime.

use std::path::Path;

use query_engine_metadata::metadata::{self, AttributeType, EntityModel};

use crate::configuration::Configuration;
use crate::error::{MakeRuntimeConfigurationError, MetadataError};
use crate::version1::ParsedConfiguration;

/// Convert the parsed configuration into a runtime one, rejecting inconsistent entity models.
/// A relative data file is resolved against `configuration_dir`.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    configuration_dir: impl AsRef<Path>,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let errors = validate_metadata(&parsed_config.metadata);
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!(error = %error, "Invalid entity model");
        }
        return Err(MakeRuntimeConfigurationError::InvalidMetadata(errors));
    }

    let data_file = parsed_config
        .data_file
        .map(|file| configuration_dir.as_ref().join(file));

    Ok(Configuration {
        metadata: parsed_config.metadata,
        fetch_settings: parsed_config.fetch_settings,
        data_file,
    })
}

/// Collect every inconsistency in the entity model.
pub fn validate_metadata(metadata: &metadata::Metadata) -> Vec<MetadataError> {
    let mut errors = vec![];

    for (entity_name, entity) in &metadata.entities.0 {
        match entity.attributes.get(&entity.id_attribute) {
            None => errors.push(MetadataError::MissingIdAttribute {
                entity: entity_name.clone(),
                id_attribute: entity.id_attribute.clone(),
            }),
            Some(attribute) if !matches!(attribute.r#type, AttributeType::Basic { .. }) => {
                errors.push(MetadataError::InvalidIdAttribute {
                    entity: entity_name.clone(),
                    id_attribute: entity.id_attribute.clone(),
                });
            }
            Some(_) => {}
        }

        for (attribute_name, attribute) in &entity.attributes {
            if let Some(enum_type) = attribute.r#type.enum_type() {
                if metadata.enum_type(enum_type).is_none() {
                    errors.push(MetadataError::UnknownEnumType {
                        entity: entity_name.clone(),
                        attribute: attribute_name.clone(),
                        enum_type: enum_type.to_string(),
                    });
                }
            }

            if let AttributeType::Association {
                target, mapped_by, ..
            } = &attribute.r#type
            {
                if metadata.entity(target).is_none() {
                    errors.push(MetadataError::UnknownAssociationTarget {
                        entity: entity_name.clone(),
                        attribute: attribute_name.clone(),
                        target: target.clone(),
                    });
                    continue;
                }

                if let Some(mapped_by) = mapped_by {
                    let maps_back = metadata
                        .attribute(target, mapped_by)
                        .is_some_and(|owner| match &owner.info.r#type {
                            AttributeType::Association { target, .. } => target == entity_name,
                            _ => false,
                        });
                    if !maps_back {
                        errors.push(MetadataError::InvalidMappedBy {
                            entity: entity_name.clone(),
                            attribute: attribute_name.clone(),
                            target: target.clone(),
                            mapped_by: mapped_by.clone(),
                        });
                    }
                }
            }
        }
    }

    errors
}
