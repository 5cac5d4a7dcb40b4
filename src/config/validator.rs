//! Config validation: unique names, envelopes present, relation targets declared.

use crate::config::FullConfig;
use crate::error::ConfigError;
use crate::model::{RelatedType, Registry};
use std::collections::HashSet;

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for e in &config.entities {
        if e.name.trim().is_empty() {
            return Err(ConfigError::Validation("entity name must not be empty".into()));
        }
        if !names.insert(e.name.as_str()) {
            return Err(ConfigError::DuplicateEntity(e.name.clone()));
        }
        if e.envelope.is_none() {
            return Err(ConfigError::MissingEnvelope(e.name.clone()));
        }
    }

    for e in &config.entities {
        let mut fields = HashSet::new();
        for f in &e.fields {
            if f.name == "id" {
                return Err(ConfigError::Validation(format!("{}: 'id' is implicit and cannot be declared", e.name)));
            }
            if !fields.insert(f.name.as_str()) {
                return Err(ConfigError::Validation(format!("{}: duplicate field '{}'", e.name, f.name)));
            }
        }
        for r in &e.relations {
            if !names.contains(r.model.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "relation model",
                    id: format!("{}.{} -> {}", e.name, r.name, r.model),
                });
            }
        }
    }

    Ok(())
}

/// Every named relation in the registry must resolve.
pub fn validate_registry(registry: &Registry) -> Result<(), ConfigError> {
    for ty in registry.iter() {
        for rel in ty.relations() {
            if let RelatedType::Named(name) = &rel.related {
                if registry.get(name).is_none() {
                    return Err(ConfigError::MissingReference {
                        kind: "relation model",
                        id: format!("{}.{} -> {}", ty.name(), rel.field_name, name),
                    });
                }
            }
        }
    }
    Ok(())
}
