//! Raw config types: client settings and JSON entity declarations.

use crate::model::{FieldKind, IdKind, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

/// Key naming used on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireCase {
    /// Keys are used as-is.
    #[default]
    AsIs,
    /// Backend speaks camelCase; local fields are snake_case.
    Camel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Default base URL for entity types that do not set their own.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Scheme and host that relative URLs are resolved against, e.g. `http://localhost:8080`.
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub wire_case: WireCase,
    /// Request timeout; unset means requests wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: default_base_url(),
            origin: None,
            wire_case: WireCase::default(),
            timeout_secs: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Field holding the nested payload.
    pub name: String,
    /// Name of the related entity type.
    pub model: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeConfig {
    Bare,
    ResultsOrEntryPoint,
    Key(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub id_kind: IdKind,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    /// Required; kept optional here so a missing envelope is reported by validation.
    #[serde(default)]
    pub envelope: Option<EnvelopeConfig>,
}

/// Client settings plus entity declarations in one document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}
