//! Turn validated entity declarations into a registry of entity types.

use crate::config::{validate, EnvelopeConfig, FullConfig};
use crate::error::ConfigError;
use crate::model::{Envelope, EntityType, RelatedType, Registry};

impl From<&EnvelopeConfig> for Envelope {
    fn from(cfg: &EnvelopeConfig) -> Self {
        match cfg {
            EnvelopeConfig::Bare => Envelope::Bare,
            EnvelopeConfig::ResultsOrEntryPoint => Envelope::ResultsOrEntryPoint,
            EnvelopeConfig::Key(k) => Envelope::Key(k.clone()),
        }
    }
}

/// Validate and build every declared entity type. Relations resolve by name through the registry.
pub fn resolve(config: &FullConfig) -> Result<Registry, ConfigError> {
    validate(config)?;
    let mut registry = Registry::new();
    for e in &config.entities {
        let mut builder = EntityType::builder(e.name.clone())
            .base_url(e.base_url.clone().unwrap_or_else(|| config.client.base_url.clone()))
            .id_kind(e.id_kind);
        if let Some(ep) = &e.entry_point {
            builder = builder.entry_point(ep.clone());
        }
        for f in &e.fields {
            builder = builder.field(f.name.clone(), f.kind);
        }
        for r in &e.relations {
            builder = builder.relation(r.name.clone(), RelatedType::named(r.model.clone()));
        }
        if let Some(env) = &e.envelope {
            builder = builder.envelope(env.into());
        }
        registry.register(builder.build()?)?;
    }
    Ok(registry)
}
