//! Transport seam: issue a request with an optional JSON body and return the parsed JSON body.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Fails on network errors and on non-success statuses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> ClientResult<Value>;
}

/// reqwest-backed transport. Relative URLs are resolved against the configured origin.
pub struct HttpTransport {
    client: Client,
    origin: Option<Url>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let origin = match &config.origin {
            Some(o) => Some(Url::parse(o).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", o, e)))?),
            None => None,
        };
        Ok(HttpTransport {
            client: builder.build()?,
            origin,
        })
    }

    fn resolve(&self, url: &str) -> ClientResult<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        match &self.origin {
            Some(origin) => origin
                .join(url)
                .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e))),
            None => Err(ClientError::InvalidUrl(format!("{}: relative url and no origin configured", url))),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> ClientResult<Value> {
        let target = self.resolve(url)?;
        let mut req = self.client.request(method.into(), target);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body: serde_json::from_slice(&bytes).ok(),
            });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
