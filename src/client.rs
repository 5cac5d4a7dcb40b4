//! Client: injected transport, entity registry and config; type-level reads and instance mutations.
//!
//! Reads log and propagate failures. Instance mutations (`save`, `delete`) log and swallow
//! failures; callers check the instance identity afterwards.

use crate::case::value_keys_to_camel_case_recursive;
use crate::collection::Id;
use crate::config::{validate_registry, ClientConfig, WireCase};
use crate::error::ClientResult;
use crate::model::{Entity, EntityType, Materialized, Materializer, Registry};
use crate::query::{Query, Subject};
use crate::response::{DeleteManyRequest, DeleteResponse, SaveResponse};
use crate::transport::{HttpTransport, Method, Transport};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    materializer: Materializer,
}

impl Client {
    /// Types without their own base URL inherit `config.base_url`; named relations must resolve.
    pub fn new(transport: Arc<dyn Transport>, registry: Registry, config: ClientConfig) -> ClientResult<Self> {
        registry.inherit_base_url(&config.base_url);
        validate_registry(&registry)?;
        let materializer = Materializer::new(Arc::new(registry), config.wire_case);
        Ok(Client {
            transport,
            config: Arc::new(config),
            materializer,
        })
    }

    /// Client over [`HttpTransport`].
    pub fn http(registry: Registry, config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::new(Arc::new(transport), registry, config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.materializer.registry()
    }

    pub fn entity_type(&self, name: &str) -> ClientResult<Arc<EntityType>> {
        self.registry().resolve(name)
    }

    pub(crate) async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> ClientResult<Value> {
        tracing::debug!(method = %method, url = %url, "request");
        self.transport.request(method, url, body).await
    }

    /// Query against a type or bound to an instance.
    pub fn query(&self, subject: impl Into<Subject>) -> Query {
        Query::new(self, subject)
    }

    /// Query with relations to eager-load.
    pub fn with<I, S>(&self, entity_type: &Arc<EntityType>, relations: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::new(self, entity_type).include(relations)
    }

    /// List resources, optionally filtered by exact-match pairs.
    pub async fn fetch_all(&self, entity_type: &Arc<EntityType>, filter: &[(&str, &str)]) -> ClientResult<Materialized> {
        let mut query = Query::new(self, entity_type);
        for (k, v) in filter {
            query = query.where_eq(*k, *v);
        }
        query.get().await
    }

    pub async fn fetch_one(&self, entity_type: &Arc<EntityType>, id: impl Into<Id>) -> ClientResult<Materialized> {
        Query::new(self, entity_type).limit_to_id(id).get().await
    }

    /// List resources scoped under a parent instance, e.g. `GET /school/3/student`.
    pub async fn fetch_under(&self, entity_type: &Arc<EntityType>, parent: &Entity) -> ClientResult<Materialized> {
        Query::new(self, entity_type).scoped_under(parent).get().await
    }

    pub fn from_payload(&self, entity_type: &Arc<EntityType>, payload: Value) -> ClientResult<Materialized> {
        self.materializer.from_payload(entity_type, payload)
    }

    /// Relations hydrate in the background after this returns.
    pub fn materialize(&self, entity_type: &Arc<EntityType>, data: Value) -> ClientResult<Materialized> {
        self.materializer.materialize(entity_type, data)
    }

    /// Relations, nested ones included, are hydrated before this returns.
    pub async fn materialize_with_relations(&self, entity_type: &Arc<EntityType>, data: Value) -> ClientResult<Materialized> {
        self.materializer.materialize_with_relations(entity_type, data).await
    }

    /// Independent copy of an entity, re-materialized from its payload with fresh relation slots.
    pub fn duplicate(&self, entity: &Entity) -> ClientResult<Entity> {
        self.materialize(entity.entity_type(), entity.to_payload())?.into_one()
    }

    /// `DELETE {segment}/{id}`; returns the raw response.
    pub async fn delete_by_id(&self, entity_type: &Arc<EntityType>, id: impl Into<Id>) -> ClientResult<Value> {
        let url = entity_type.url_for([id.into()]);
        self.request(Method::Delete, &url, None)
            .await
            .inspect_err(|e| tracing::error!(url = %url, error = %e, "error deleting"))
    }

    /// `POST {segment}/delete` with `{ids: [...]}`; returns the raw response.
    pub async fn delete_many(&self, entity_type: &Arc<EntityType>, ids: &[Id]) -> ClientResult<Value> {
        let url = entity_type.url_for(["delete"]);
        let body = serde_json::to_value(DeleteManyRequest { ids })?;
        self.request(Method::Post, &url, Some(&body))
            .await
            .inspect_err(|e| tracing::error!(url = %url, count = ids.len(), error = %e, "error deleting"))
    }

    fn wire_body(&self, entity: &Entity) -> Value {
        let mut body = entity.to_payload();
        if self.config.wire_case == WireCase::Camel {
            value_keys_to_camel_case_recursive(&mut body);
        }
        body
    }
}

impl Entity {
    /// POST when not yet persisted, PUT otherwise. On a success envelope the identity becomes
    /// `item.id`; on failure the instance is left unchanged.
    pub async fn save(&mut self, client: &Client) -> &mut Self {
        let (method, url) = if self.is_persisted() {
            (Method::Put, self.url())
        } else {
            (Method::Post, self.entity_type().url().to_string())
        };
        let body = client.wire_body(self);
        let reply = match client.request(method, &url, Some(&body)).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(method = %method, url = %url, error = %e, "error saving");
                return self;
            }
        };
        let parsed: SaveResponse = match serde_json::from_value(reply.clone()) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(url = %url, error = %e, response = %reply, "unexpected save response");
                return self;
            }
        };
        if !parsed.is_success() {
            tracing::error!(url = %url, response = %reply, "save rejected");
            return self;
        }
        let assigned = parsed.item_id().and_then(|v| self.entity_type().id_from_value(v));
        match assigned {
            Some(id) => self.set_id(Some(id)),
            None => tracing::warn!(url = %url, response = %reply, "save succeeded without item id"),
        }
        self
    }

    /// DELETE the resource; on `{success: true}` the identity is cleared. No request when not persisted.
    pub async fn delete(&mut self, client: &Client) -> &mut Self {
        if !self.is_persisted() {
            return self;
        }
        let url = self.url();
        let reply = match client.request(Method::Delete, &url, None).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "error deleting");
                return self;
            }
        };
        let parsed: DeleteResponse = serde_json::from_value(reply.clone()).unwrap_or_default();
        if parsed.success {
            self.set_id(None);
        } else {
            tracing::error!(url = %url, response = %reply, "delete rejected");
        }
        self
    }
}
