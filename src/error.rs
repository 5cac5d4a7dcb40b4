//! Typed errors for configuration, transport and materialization.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate entity type: {0}")]
    DuplicateEntity(String),
    #[error("entity type '{0}' has no envelope")]
    MissingEnvelope(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} responded with status {status}")]
    Status {
        status: u16,
        url: String,
        body: Option<serde_json::Value>,
    },
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("relation resolution: {0}")]
    RelationResolution(String),
    #[error("item has no identity: {0}")]
    MissingIdentity(String),
    #[error("materialization: {0}")]
    Materialization(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// True for network failures and non-success responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Status { .. })
    }

    /// HTTP status of a non-success response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
