//! Ordered container keyed by identity. Iteration and `at` follow insertion order.

use crate::error::{ClientError, ClientResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Identity value of a remote resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Text(String),
}

impl Id {
    /// Read an identity from a JSON value. Numbers must be integral; strings are taken as-is.
    pub fn from_json(v: &Value) -> Option<Id> {
        match v {
            Value::Number(n) => n.as_i64().map(Id::Int),
            Value::String(s) => Some(Id::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Id::Int(n) => Value::Number((*n).into()),
            Id::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Int(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Int(n.into())
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Text(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Text(s)
    }
}

impl From<uuid::Uuid> for Id {
    fn from(u: uuid::Uuid) -> Self {
        Id::Text(u.to_string())
    }
}

/// Anything that exposes an identity field usable as a collection key.
pub trait Identified {
    fn identity(&self) -> Option<Id>;
}

impl Identified for Value {
    fn identity(&self) -> Option<Id> {
        self.get("id").and_then(Id::from_json)
    }
}

/// Ordered mapping from identity to item.
///
/// Re-inserting an existing identity replaces the value and keeps its original position.
#[derive(Clone, Debug)]
pub struct Collection<T> {
    entries: IndexMap<Id, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection {
            entries: IndexMap::new(),
        }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under an explicit key, bypassing identity derivation. Returns the replaced value.
    pub fn insert_with_key(&mut self, key: Id, item: T) -> Option<T> {
        self.entries.insert(key, item)
    }

    pub fn get(&self, key: &Id) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &Id) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &Id) -> bool {
        self.entries.contains_key(key)
    }

    /// Value at ordinal position, independent of key. `None` past the end.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.entries.get_index(index).map(|(_, v)| v)
    }

    /// Remove by key; later entries shift down one position.
    pub fn remove(&mut self, key: &Id) -> Option<T> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &T)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Id> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Replace every value with `f(value, key)`, keeping keys and order.
    pub fn transform_in_place<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(T, &Id) -> T,
    {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .map(|(k, v)| {
                let v = f(v, &k);
                (k, v)
            })
            .collect();
        self
    }

    /// New collection of `f(value, key)`, re-keyed by the projected values' own identity.
    pub fn project<U, F>(&self, mut f: F) -> ClientResult<Collection<U>>
    where
        U: Identified,
        F: FnMut(&T, &Id) -> U,
    {
        let mut out = Collection::new();
        for (k, v) in &self.entries {
            out.insert(f(v, k))?;
        }
        Ok(out)
    }

    /// Projection where `f` supplies the key alongside each value.
    pub fn project_keyed<U, F>(&self, mut f: F) -> Collection<U>
    where
        F: FnMut(&T, &Id) -> (Id, U),
    {
        let mut out = Collection::new();
        for (k, v) in &self.entries {
            let (key, value) = f(v, k);
            out.insert_with_key(key, value);
        }
        out
    }

    pub fn into_values(self) -> Vec<T> {
        self.entries.into_values().collect()
    }
}

impl<T: Identified> Collection<T> {
    /// Build from items in order, keyed by each item's identity.
    pub fn from_items<I>(items: I) -> ClientResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut out = Collection::new();
        for item in items {
            out.insert(item)?;
        }
        Ok(out)
    }

    /// Insert keyed by the item's identity. Fails when the item has none.
    pub fn insert(&mut self, item: T) -> ClientResult<Option<T>> {
        let key = item
            .identity()
            .ok_or_else(|| ClientError::MissingIdentity("cannot key collection entry".into()))?;
        Ok(self.insert_with_key(key, item))
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = (Id, T);
    type IntoIter = indexmap::map::IntoIter<Id, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Serialized as a JSON array of values in order.
impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.values())
    }
}
