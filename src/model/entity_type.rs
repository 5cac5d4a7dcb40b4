//! Entity type schema: URL mapping, identity kind, declared fields, relations and envelope.

use crate::case::to_snake_case;
use crate::collection::Id;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Base URL used when neither the type nor the client config provides one.
pub const DEFAULT_BASE_URL: &str = "/api";

/// How identity values of a type are read from payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    #[default]
    Int,
    Text,
    Uuid,
}

/// Semantic type of a declared field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Any,
    Integer,
    Number,
    Text,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    /// Null is accepted by every kind.
    pub fn accepts(&self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) | (FieldKind::Any, _) => true,
            (FieldKind::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            (FieldKind::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

/// Target of a relation: a type reference, or a name looked up in the registry on hydration.
#[derive(Clone, Debug)]
pub enum RelatedType {
    Static(Arc<EntityType>),
    Named(String),
}

impl RelatedType {
    pub fn named(name: impl Into<String>) -> Self {
        RelatedType::Named(name.into())
    }
}

impl From<&Arc<EntityType>> for RelatedType {
    fn from(ty: &Arc<EntityType>) -> Self {
        RelatedType::Static(Arc::clone(ty))
    }
}

/// A field holding a nested payload that hydrates into instances of another type.
#[derive(Clone, Debug)]
pub struct Relation {
    pub field_name: String,
    pub related: RelatedType,
}

/// Unwraps the response envelope before materialization. Every type must declare one.
#[derive(Clone)]
pub enum Envelope {
    /// The payload is the data.
    Bare,
    /// Data lives under this key; payloads without it are taken as bare.
    Key(String),
    /// `results`, else the entry-point key, else the payload itself.
    ResultsOrEntryPoint,
    Custom(Arc<dyn Fn(Value) -> Value + Send + Sync>),
}

impl Envelope {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Envelope::Custom(Arc::new(f))
    }

    pub fn unwrap_payload(&self, ty: &EntityType, payload: Value) -> Value {
        match self {
            Envelope::Bare => payload,
            Envelope::Key(key) => take_key(payload, key),
            Envelope::ResultsOrEntryPoint => {
                let has_results = payload.get("results").is_some_and(is_present);
                if has_results {
                    return take_key(payload, "results");
                }
                match ty.entry_point() {
                    Some(ep) => take_key(payload, ep),
                    None => payload,
                }
            }
            Envelope::Custom(f) => f(payload),
        }
    }
}

fn is_present(v: &Value) -> bool {
    !v.is_null()
}

fn take_key(payload: Value, key: &str) -> Value {
    match payload {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner) if is_present(&inner) => inner,
            Some(inner) => {
                map.insert(key.to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Envelope::Bare => f.write_str("Bare"),
            Envelope::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Envelope::ResultsOrEntryPoint => f.write_str("ResultsOrEntryPoint"),
            Envelope::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declared kind of remote resource. Lives for the process; the base URL is memoized on first use.
#[derive(Debug)]
pub struct EntityType {
    name: String,
    base_url: RwLock<Option<String>>,
    entry_point: Option<String>,
    id_kind: IdKind,
    fields: Vec<FieldSpec>,
    relations: Vec<Relation>,
    envelope: Envelope,
    url: OnceLock<String>,
}

impl EntityType {
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            base_url: None,
            entry_point: None,
            id_kind: IdKind::default(),
            fields: Vec::new(),
            relations: Vec::new(),
            envelope: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, field_name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field_name == field_name)
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Configured base URL, if any.
    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the base URL. Has no effect on URLs once the first one has been rendered.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        if self.url.get().is_some() {
            tracing::debug!(entity = %self.name, "base url changed after url was memoized");
        }
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = Some(base_url.into());
    }

    /// Set the base URL only when the type has none of its own.
    pub fn inherit_base_url(&self, default: &str) {
        let mut guard = self.base_url.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(default.to_string());
        }
    }

    /// Path segment: the entry point, else the snake_case type name.
    pub fn segment(&self) -> String {
        match &self.entry_point {
            Some(ep) => ep.clone(),
            None => to_snake_case(&self.name),
        }
    }

    /// `{base_url}/{segment}`, computed once and stable afterwards.
    pub fn url(&self) -> &str {
        self.url.get_or_init(|| {
            let base = self.base_url().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            let segment = self.segment();
            if base.is_empty() {
                segment
            } else {
                format!("{}/{}", base.trim_end_matches('/'), segment)
            }
        })
    }

    /// Base URL with `extra` segments appended, joined by '/'.
    pub fn url_for<I, S>(&self, extra: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        let mut url = self.url().to_string();
        for segment in extra {
            url.push('/');
            url.push_str(&segment.to_string());
        }
        url
    }

    /// Read an identity according to the type's id kind.
    pub fn id_from_value(&self, v: &Value) -> Option<Id> {
        match (self.id_kind, v) {
            (IdKind::Int, Value::Number(n)) => n.as_i64().map(Id::Int),
            (IdKind::Int, Value::String(s)) => match s.parse::<i64>() {
                Ok(n) => Some(Id::Int(n)),
                Err(_) => Some(Id::Text(s.clone())),
            },
            (IdKind::Text, Value::Number(n)) => Some(Id::Text(n.to_string())),
            (IdKind::Text, Value::String(s)) => Some(Id::Text(s.clone())),
            (IdKind::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s).ok().map(Id::from),
            _ => None,
        }
    }
}

pub struct EntityTypeBuilder {
    name: String,
    base_url: Option<String>,
    entry_point: Option<String>,
    id_kind: IdKind,
    fields: Vec<FieldSpec>,
    relations: Vec<Relation>,
    envelope: Option<Envelope>,
}

impl EntityTypeBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    pub fn id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = id_kind;
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn relation(mut self, field_name: impl Into<String>, related: impl Into<RelatedType>) -> Self {
        self.relations.push(Relation {
            field_name: field_name.into(),
            related: related.into(),
        });
        self
    }

    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    pub fn build(self) -> Result<Arc<EntityType>, ConfigError> {
        let envelope = self.envelope.ok_or_else(|| ConfigError::MissingEnvelope(self.name.clone()))?;
        Ok(Arc::new(EntityType {
            name: self.name,
            base_url: RwLock::new(self.base_url),
            entry_point: self.entry_point,
            id_kind: self.id_kind,
            fields: self.fields,
            relations: self.relations,
            envelope,
            url: OnceLock::new(),
        }))
    }
}
