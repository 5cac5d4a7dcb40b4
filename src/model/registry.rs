//! Startup-populated lookup of entity types by name, used to resolve named relations.

use crate::error::{ClientError, ClientResult, ConfigError};
use crate::model::{EntityType, RelatedType};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Registry {
    types: IndexMap<String, Arc<EntityType>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity_type: Arc<EntityType>) -> Result<(), ConfigError> {
        let name = entity_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(ConfigError::DuplicateEntity(name));
        }
        self.types.insert(name, entity_type);
        Ok(())
    }

    /// Builder-style [`Registry::register`].
    pub fn with(mut self, entity_type: &Arc<EntityType>) -> Result<Self, ConfigError> {
        self.register(Arc::clone(entity_type))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.types.get(name)
    }

    pub fn resolve(&self, name: &str) -> ClientResult<Arc<EntityType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::RelationResolution(format!("unknown entity type '{}'", name)))
    }

    pub fn resolve_related(&self, related: &RelatedType) -> ClientResult<Arc<EntityType>> {
        match related {
            RelatedType::Static(ty) => Ok(Arc::clone(ty)),
            RelatedType::Named(name) => self.resolve(name),
        }
    }

    /// Give every type without its own base URL the default.
    pub fn inherit_base_url(&self, base_url: &str) {
        for ty in self.types.values() {
            ty.inherit_base_url(base_url);
        }
    }

    /// Types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
