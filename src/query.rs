//! Fluent query builder: accumulates intent, renders one URL, executes one GET.

use crate::client::Client;
use crate::collection::Id;
use crate::error::{ClientError, ClientResult};
use crate::model::{Entity, EntityType, Materialized};
use crate::transport::Method;
use serde_json::Value;
use std::sync::Arc;

/// What a query (or its parent scope) is about: a type, or one instance of it.
#[derive(Clone, Debug)]
pub enum Subject {
    Type(Arc<EntityType>),
    Instance { entity_type: Arc<EntityType>, id: Option<Id> },
}

impl Subject {
    pub fn entity_type(&self) -> &Arc<EntityType> {
        match self {
            Subject::Type(ty) => ty,
            Subject::Instance { entity_type, .. } => entity_type,
        }
    }

    fn url_for(&self, extra: Vec<String>) -> String {
        match self {
            Subject::Type(ty) => ty.url_for(extra),
            Subject::Instance { entity_type, id: Some(id) } => {
                entity_type.url_for(std::iter::once(id.to_string()).chain(extra))
            }
            Subject::Instance { entity_type, id: None } => entity_type.url_for(extra),
        }
    }
}

impl From<&Arc<EntityType>> for Subject {
    fn from(ty: &Arc<EntityType>) -> Self {
        Subject::Type(Arc::clone(ty))
    }
}

impl From<&Entity> for Subject {
    fn from(e: &Entity) -> Self {
        Subject::Instance {
            entity_type: Arc::clone(e.entity_type()),
            id: e.id().cloned(),
        }
    }
}

/// Single-use request builder. Repeated `include` names are kept once, in first-seen order.
#[derive(Clone)]
pub struct Query {
    client: Client,
    subject: Subject,
    id: Option<Id>,
    relations: Vec<String>,
    filters: Vec<(String, String)>,
    parent: Option<Box<Query>>,
}

impl Query {
    pub fn new(client: &Client, subject: impl Into<Subject>) -> Self {
        Query {
            client: client.clone(),
            subject: subject.into(),
            id: None,
            relations: Vec::new(),
            filters: Vec::new(),
            parent: None,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn target(&self) -> &Arc<EntityType> {
        self.subject.entity_type()
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    /// Scope under a parent type or instance, e.g. `/school/3/student`.
    pub fn scoped_under(mut self, parent: impl Into<Subject>) -> Self {
        self.parent = Some(Box::new(Query::new(&self.client, parent)));
        self
    }

    /// Eager-load relations, sent as `?with=a,b` with each name percent-encoded.
    pub fn include<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for r in relations {
            let r = r.into();
            if !self.relations.contains(&r) {
                self.relations.push(r);
            }
        }
        self
    }

    pub fn limit_to_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Exact-match filter, sent as an extra querystring pair after `with`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// URL without querystring. A parent scope is rendered first, then this type's segment and id.
    /// Scoping under an instance that has no identity is an error.
    fn path(&self) -> ClientResult<String> {
        let extra: Vec<String> = self.id.iter().map(Id::to_string).collect();
        match &self.parent {
            Some(parent) => {
                if let Subject::Instance { entity_type, id: None } = &parent.subject {
                    return Err(ClientError::MissingIdentity(format!(
                        "cannot scope {} under unsaved {}",
                        self.target().name(),
                        entity_type.name()
                    )));
                }
                let mut url = parent.path()?;
                url.push('/');
                url.push_str(&self.target().segment());
                for segment in extra {
                    url.push('/');
                    url.push_str(&segment);
                }
                Ok(url)
            }
            None => Ok(self.subject.url_for(extra)),
        }
    }

    fn querystring(&self) -> String {
        let mut parts = Vec::new();
        if !self.relations.is_empty() {
            let names: Vec<_> = self.relations.iter().map(|r| urlencoding::encode(r)).collect();
            parts.push(format!("with={}", names.join(",")));
        }
        for (k, v) in &self.filters {
            parts.push(format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }

    pub fn render_url(&self) -> ClientResult<String> {
        Ok(format!("{}{}", self.path()?, self.querystring()))
    }

    /// GET the rendered URL and return the raw payload.
    pub async fn execute(&self) -> ClientResult<Value> {
        let url = self
            .render_url()
            .inspect_err(|e| tracing::error!(entity = %self.target().name(), error = %e, "cannot render query url"))?;
        tracing::debug!(entity = %self.target().name(), url = %url, "query");
        self.client
            .request(Method::Get, &url, None)
            .await
            .inspect_err(|e| tracing::error!(url = %url, error = %e, "error retrieving instances"))
    }

    /// Execute and materialize through the target type's envelope.
    pub async fn get(self) -> ClientResult<Materialized> {
        let payload = self.execute().await?;
        self.client.from_payload(self.target(), payload)
    }
}
