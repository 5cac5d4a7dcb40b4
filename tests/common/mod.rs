#![allow(dead_code)]

use architect_client::{
    ClientConfig, ClientError, ClientResult, Client, EntityType, Envelope, FieldKind, Method, Registry,
    RelatedType, Transport,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// In-memory transport: canned replies per (method, url), every call recorded. Unrouted calls fail with 404.
#[derive(Default)]
pub struct RecordingTransport {
    routes: Mutex<HashMap<(String, String), Value>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: Method, url: &str, reply: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), url.to_string()), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> ClientResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });
        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(method.to_string(), url.to_string()))
            .cloned();
        reply.ok_or_else(|| ClientError::Status {
            status: 404,
            url: url.to_string(),
            body: None,
        })
    }
}

pub struct Fixture {
    pub transport: Arc<RecordingTransport>,
    pub client: Client,
    pub school: Arc<EntityType>,
    pub student: Arc<EntityType>,
    pub evaluation: Arc<EntityType>,
}

/// School <- Student (school relation by name), Evaluation with entry point and results envelope.
pub fn fixture(config: ClientConfig) -> Fixture {
    let school = EntityType::builder("School")
        .field("name", FieldKind::Text)
        .relation("district", RelatedType::named("District"))
        .envelope(Envelope::Key("data".into()))
        .build()
        .unwrap();
    let district = EntityType::builder("District")
        .envelope(Envelope::Bare)
        .build()
        .unwrap();
    let student = EntityType::builder("StudentRecord")
        .field("name", FieldKind::Text)
        .relation("school", RelatedType::named("School"))
        .relation("grades", RelatedType::named("Grade"))
        .envelope(Envelope::Bare)
        .build()
        .unwrap();
    let grade = EntityType::builder("Grade").envelope(Envelope::Bare).build().unwrap();
    let evaluation = EntityType::builder("EvaluationModel")
        .base_url("http://localhost:8080")
        .entry_point("parent")
        .envelope(Envelope::ResultsOrEntryPoint)
        .build()
        .unwrap();
    let registry = Registry::new()
        .with(&school)
        .unwrap()
        .with(&district)
        .unwrap()
        .with(&student)
        .unwrap()
        .with(&grade)
        .unwrap()
        .with(&evaluation)
        .unwrap();
    let transport = RecordingTransport::new();
    let client = Client::new(transport.clone(), registry, config).unwrap();
    Fixture {
        transport,
        client,
        school,
        student,
        evaluation,
    }
}
