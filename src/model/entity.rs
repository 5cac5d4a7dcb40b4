//! Materialized records.

use crate::collection::{Collection, Id, Identified};
use crate::error::{ClientError, ClientResult};
use crate::model::{EntityType, RelatedType};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Content of a relation field. Starts as `Raw` and is replaced once hydration runs.
#[derive(Clone, Debug)]
pub enum RelationValue {
    Raw(Value),
    One(Entity),
    Many(Collection<Entity>),
}

impl RelationValue {
    pub fn is_hydrated(&self) -> bool {
        !matches!(self, RelationValue::Raw(_))
    }

    pub fn to_payload(&self) -> Value {
        match self {
            RelationValue::Raw(v) => v.clone(),
            RelationValue::One(e) => e.to_payload(),
            RelationValue::Many(c) => Value::Array(c.values().map(Entity::to_payload).collect()),
        }
    }
}

/// Shared cell for a relation field; hydration writes into it after the entity is handed out.
pub(crate) type RelationSlot = Arc<RwLock<RelationValue>>;

/// Relation field still holding its raw payload, queued for hydration.
#[derive(Debug)]
pub(crate) struct PendingRelation {
    pub entity: String,
    pub field: String,
    pub related: RelatedType,
    pub slot: RelationSlot,
}

/// Instance of an entity type. `id == None` means not yet persisted.
///
/// Cloning shares relation slots with the original; use `Client::duplicate` for an independent copy.
#[derive(Clone, Debug)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    id: Option<Id>,
    fields: Map<String, Value>,
    extra: Map<String, Value>,
    relations: BTreeMap<String, RelationSlot>,
}

impl Entity {
    pub fn new(entity_type: &Arc<EntityType>) -> Self {
        Entity {
            entity_type: Arc::clone(entity_type),
            id: None,
            fields: Map::new(),
            extra: Map::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Shallow-merge a decoded record. Declared fields whose value has the wrong kind, and
    /// undeclared fields when the type declares any, are kept in `extra`.
    pub(crate) fn from_record(entity_type: &Arc<EntityType>, record: Map<String, Value>) -> (Entity, Vec<PendingRelation>) {
        let mut entity = Entity::new(entity_type);
        let mut pending = Vec::new();
        for (key, value) in record {
            if key == "id" {
                entity.id = entity_type.id_from_value(&value);
                if entity.id.is_none() && !value.is_null() {
                    tracing::warn!(entity = %entity_type.name(), id = %value, "unreadable identity");
                }
                continue;
            }
            if let Some(rel) = entity_type.relation(&key) {
                let hydrate = !value.is_null();
                let slot = Arc::new(RwLock::new(RelationValue::Raw(value)));
                if hydrate {
                    pending.push(PendingRelation {
                        entity: entity_type.name().to_string(),
                        field: key.clone(),
                        related: rel.related.clone(),
                        slot: Arc::clone(&slot),
                    });
                }
                entity.relations.insert(key, slot);
                continue;
            }
            entity.put_field(key, value);
        }
        (entity, pending)
    }

    fn put_field(&mut self, key: String, value: Value) {
        let ty = &self.entity_type;
        if ty.fields().is_empty() {
            self.fields.insert(key, value);
            return;
        }
        match ty.field(&key) {
            Some(spec) if spec.kind.accepts(&value) => {
                self.fields.insert(key, value);
            }
            Some(spec) => {
                tracing::warn!(entity = %ty.name(), field = %key, kind = ?spec.kind, "field kind mismatch; kept as extra");
                self.extra.insert(key, value);
            }
            None => {
                self.extra.insert(key, value);
            }
        }
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<Id>) {
        self.id = id;
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Field value from declared or extra fields. Relation fields are read with [`Entity::relation`].
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).or_else(|| self.extra.get(field))
    }

    /// Set a field. `"id"` sets the identity; a relation field gets a fresh raw slot.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        let field = field.into();
        if field == "id" {
            self.id = self.entity_type.id_from_value(&value);
        } else if self.entity_type.relation(&field).is_some() {
            self.relations
                .insert(field, Arc::new(RwLock::new(RelationValue::Raw(value))));
        } else {
            self.fields.remove(&field);
            self.extra.remove(&field);
            self.put_field(field, value);
        }
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Fields the schema does not declare, kept so they round-trip on save.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Snapshot of a relation field; may still be `Raw` while hydration is in flight.
    pub fn relation(&self, field: &str) -> Option<RelationValue> {
        self.relations
            .get(field)
            .map(|slot| slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    pub fn is_hydrated(&self, field: &str) -> bool {
        self.relations
            .get(field)
            .is_some_and(|slot| slot.read().unwrap_or_else(PoisonError::into_inner).is_hydrated())
    }

    /// Hydrated single related instance.
    pub fn related_one(&self, field: &str) -> ClientResult<Entity> {
        match self.relation(field) {
            Some(RelationValue::One(e)) => Ok(e),
            Some(_) => Err(ClientError::Materialization(format!("relation '{}' is not a hydrated record", field))),
            None => Err(ClientError::Materialization(format!("no relation '{}'", field))),
        }
    }

    /// Hydrated related collection.
    pub fn related_many(&self, field: &str) -> ClientResult<Collection<Entity>> {
        match self.relation(field) {
            Some(RelationValue::Many(c)) => Ok(c),
            Some(_) => Err(ClientError::Materialization(format!("relation '{}' is not a hydrated collection", field))),
            None => Err(ClientError::Materialization(format!("no relation '{}'", field))),
        }
    }

    /// Resource URL: the type URL plus the identity when persisted.
    pub fn url(&self) -> String {
        match &self.id {
            Some(id) => self.entity_type.url_for([id]),
            None => self.entity_type.url().to_string(),
        }
    }

    /// All fields as a JSON object, relations rendered from their current slot value.
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.id {
            map.insert("id".to_string(), id.to_json());
        }
        for (k, v) in self.fields.iter().chain(self.extra.iter()) {
            map.insert(k.clone(), v.clone());
        }
        for (k, slot) in &self.relations {
            let value = slot.read().unwrap_or_else(PoisonError::into_inner).to_payload();
            map.insert(k.clone(), value);
        }
        Value::Object(map)
    }
}

impl Identified for Entity {
    fn identity(&self) -> Option<Id> {
        self.id.clone()
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_payload().serialize(serializer)
    }
}
