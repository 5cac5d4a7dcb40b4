//! Architect client: ActiveRecord-style access to configuration-driven REST backends.

pub mod case;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod response;
pub mod transport;

pub use client::Client;
pub use collection::{Collection, Id, Identified};
pub use config::{load_from_path, load_from_str, resolve, ClientConfig, FullConfig, WireCase};
pub use error::{ClientError, ClientResult, ConfigError};
pub use model::{
    Entity, EntityType, Envelope, FieldKind, IdKind, Materialized, RelatedType, RelationValue, Registry,
};
pub use query::{Query, Subject};
pub use transport::{HttpTransport, Method, Transport};
