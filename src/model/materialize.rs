//! Payload to instance materialization and relation hydration.
//!
//! `materialize` returns as soon as the records are built; relation fields are hydrated by
//! detached tokio tasks afterwards, so readers may briefly observe raw payloads.
//! `materialize_with_relations` hydrates the whole relation tree before returning.

use crate::case::value_keys_to_snake_case_recursive;
use crate::collection::Collection;
use crate::config::WireCase;
use crate::error::{ClientError, ClientResult};
use crate::model::entity::{PendingRelation, RelationValue};
use crate::model::{Entity, EntityType, Registry};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::{Arc, PoisonError};

/// Result of materializing a payload: a single record or an ordered collection.
#[derive(Clone, Debug)]
pub enum Materialized {
    One(Entity),
    Many(Collection<Entity>),
}

impl Materialized {
    pub fn is_many(&self) -> bool {
        matches!(self, Materialized::Many(_))
    }

    pub fn into_one(self) -> ClientResult<Entity> {
        match self {
            Materialized::One(e) => Ok(e),
            Materialized::Many(c) => Err(ClientError::Materialization(format!(
                "expected a single record, got a collection of {}",
                c.len()
            ))),
        }
    }

    pub fn into_many(self) -> ClientResult<Collection<Entity>> {
        match self {
            Materialized::Many(c) => Ok(c),
            Materialized::One(_) => Err(ClientError::Materialization(
                "expected a collection, got a single record".into(),
            )),
        }
    }
}

impl Serialize for Materialized {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Materialized::One(e) => e.serialize(serializer),
            Materialized::Many(c) => c.serialize(serializer),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Materializer {
    registry: Arc<Registry>,
    wire_case: WireCase,
}

impl Materializer {
    pub fn new(registry: Arc<Registry>, wire_case: WireCase) -> Self {
        Materializer { registry, wire_case }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Unwrap the type's envelope, then materialize.
    pub fn from_payload(&self, entity_type: &Arc<EntityType>, payload: Value) -> ClientResult<Materialized> {
        let data = entity_type.envelope().unwrap_payload(entity_type, payload);
        self.materialize(entity_type, data)
    }

    /// Build instances now; hydrate relations in the background.
    pub fn materialize(&self, entity_type: &Arc<EntityType>, data: Value) -> ClientResult<Materialized> {
        let mut pending = Vec::new();
        let out = self.build(entity_type, data, &mut pending)?;
        self.spawn_hydration(pending);
        Ok(out)
    }

    /// Build instances and hydrate every relation, nested ones included, before returning.
    pub async fn materialize_with_relations(
        &self,
        entity_type: &Arc<EntityType>,
        data: Value,
    ) -> ClientResult<Materialized> {
        let mut pending = Vec::new();
        let out = self.build(entity_type, data, &mut pending)?;
        while let Some(relation) = pending.pop() {
            self.hydrate(relation, &mut pending);
            tokio::task::yield_now().await;
        }
        Ok(out)
    }

    fn build(
        &self,
        entity_type: &Arc<EntityType>,
        data: Value,
        pending: &mut Vec<PendingRelation>,
    ) -> ClientResult<Materialized> {
        match data {
            Value::Array(items) => {
                let mut collection = Collection::new();
                for item in items {
                    let entity = self.record(entity_type, item, pending)?;
                    collection.insert(entity)?;
                }
                Ok(Materialized::Many(collection))
            }
            other => self.record(entity_type, other, pending).map(Materialized::One),
        }
    }

    fn record(
        &self,
        entity_type: &Arc<EntityType>,
        mut data: Value,
        pending: &mut Vec<PendingRelation>,
    ) -> ClientResult<Entity> {
        if self.wire_case == WireCase::Camel {
            value_keys_to_snake_case_recursive(&mut data);
        }
        let map = match data {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::Materialization(format!(
                    "{}: expected an object record, got {}",
                    entity_type.name(),
                    json_kind(&other)
                )))
            }
        };
        let (entity, mut queued) = Entity::from_record(entity_type, map);
        pending.append(&mut queued);
        Ok(entity)
    }

    fn spawn_hydration(&self, pending: Vec<PendingRelation>) {
        if pending.is_empty() {
            return;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!(count = pending.len(), "no async runtime; relations left unhydrated");
                return;
            }
        };
        for relation in pending {
            let materializer = self.clone();
            handle.spawn(async move {
                let mut nested = Vec::new();
                materializer.hydrate(relation, &mut nested);
                materializer.spawn_hydration(nested);
            });
        }
    }

    /// Replace a raw relation payload with materialized instances. Failures are logged and the
    /// raw payload stays in place.
    fn hydrate(&self, relation: PendingRelation, pending: &mut Vec<PendingRelation>) {
        let related = match self.registry.resolve_related(&relation.related) {
            Ok(ty) => ty,
            Err(e) => {
                tracing::error!(entity = %relation.entity, field = %relation.field, error = %e, "error loading related type");
                return;
            }
        };
        let raw = match &*relation.slot.read().unwrap_or_else(PoisonError::into_inner) {
            RelationValue::Raw(v) => v.clone(),
            _ => return,
        };
        let mut nested = Vec::new();
        let hydrated = match self.build(&related, raw, &mut nested) {
            Ok(Materialized::One(e)) => RelationValue::One(e),
            Ok(Materialized::Many(c)) => RelationValue::Many(c),
            Err(e) => {
                tracing::error!(entity = %relation.entity, field = %relation.field, error = %e, "error hydrating relation");
                return;
            }
        };
        *relation.slot.write().unwrap_or_else(PoisonError::into_inner) = hydrated;
        pending.append(&mut nested);
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
