use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{segments, GatewayError, PersistenceGateway};

// ---

/// Firebase-style realtime database over its REST interface.
///
/// Every path maps to `{base_url}/{path}.json`; `PUT` overwrites, `POST`
/// pushes a child with a server-generated key, `GET` reads, `DELETE` removes.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Body returned by a push.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl RestGateway {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self> {
        // ---
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn url(&self, path: &str) -> Result<String, GatewayError> {
        let path = segments(path)?.join("/");
        Ok(format!("{}/{}.json", self.base_url, path))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        // ---
        let mut req = self.client.request(method, self.url(path)?);
        if let Some(token) = &self.auth_token {
            req = req.query(&[("auth", token)]);
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response, GatewayError> {
        // ---
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("rest store: {} answered {}", path, status);
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    // ---
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), GatewayError> {
        let req = self.request(Method::PUT, path)?.json(value);
        self.send(req, path).await?;
        Ok(())
    }

    async fn append(&self, path: &str, value: &Value) -> Result<String, GatewayError> {
        // ---
        let req = self.request(Method::POST, path)?.json(value);
        let pushed: PushResponse = self.send(req, path).await?.json().await?;
        Ok(pushed.name)
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, GatewayError> {
        // ---
        let req = self.request(Method::GET, path)?;
        let body: Value = self.send(req, path).await?.json().await?;

        // Missing paths come back as a literal `null`
        Ok(match body {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let req = self.request(Method::DELETE, path)?;
        self.send(req, path).await?;
        Ok(())
    }
}
