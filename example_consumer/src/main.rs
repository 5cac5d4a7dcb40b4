//! Example consumer: a separate Rust project that uses architect-client as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Set `ARCHITECT_CONFIG` to a JSON entity config, `ARCHITECT_ORIGIN` to the backend origin.

use architect_client::{
    load_from_path, resolve, Client, ClientConfig, EntityType, Envelope, Materialized, RelatedType, Registry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("architect_client=info")),
        )
        .init();

    let (registry, mut config) = match std::env::var("ARCHITECT_CONFIG") {
        Ok(path) => {
            let full = load_from_path(&path).await?;
            (resolve(&full)?, full.client)
        }
        Err(_) => (default_registry()?, ClientConfig::default()),
    };
    if config.origin.is_none() {
        config.origin = Some(std::env::var("ARCHITECT_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".into()));
    }

    let client = Client::http(registry, config)?;
    let evaluations = client.entity_type("EvaluationModel")?;
    match client.with(&evaluations, ["school"]).get().await? {
        Materialized::Many(list) => {
            tracing::info!(count = list.len(), "evaluations loaded");
            for (id, evaluation) in list.iter() {
                tracing::info!(%id, payload = %evaluation.to_payload(), "evaluation");
            }
        }
        Materialized::One(evaluation) => {
            tracing::info!(payload = %evaluation.to_payload(), "single evaluation");
        }
    }
    Ok(())
}

fn default_registry() -> Result<Registry, architect_client::ConfigError> {
    let school = EntityType::builder("SchoolModel")
        .envelope(Envelope::ResultsOrEntryPoint)
        .build()?;
    let evaluation = EntityType::builder("EvaluationModel")
        .entry_point("parent")
        .relation("school", RelatedType::named("SchoolModel"))
        .envelope(Envelope::ResultsOrEntryPoint)
        .build()?;
    Registry::new().with(&school)?.with(&evaluation)
}
