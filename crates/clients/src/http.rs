use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use saga::ServiceError;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Path every downstream service answers health probes on.
pub const HEALTH_PATH: &str = "/manage/health";

/// Builds the HTTP client shared by every service client.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Base URL plus shared client for one downstream service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    name: &'static str,
    base_url: String,
    client: Client,
}

impl ServiceClient {
    pub fn new(name: &'static str, base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            name,
            base_url,
            client,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probes the service's health endpoint.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.send(self.get(HEALTH_PATH)).await.map(drop)
    }

    /// Sends the request and turns every non-2xx answer into a
    /// [`ServiceError`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(service = self.name, error = %e, "request failed");
            ServiceError::Transport(format!("{}: {e}", self.name))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(service = self.name, %status, %body, "service answered with an error");
        Err(status_error(status, body))
    }

    /// Sends the request and decodes a JSON answer.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Decode(format!("{}: {e}", self.name)))
    }
}

fn status_error(status: StatusCode, body: String) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(&body).map(|b| b.message);
    match (status, message) {
        (StatusCode::BAD_REQUEST, Ok(message)) => ServiceError::Rejected(message),
        (StatusCode::NOT_FOUND, Ok(message)) => ServiceError::NotFound(message),
        (StatusCode::NOT_FOUND, Err(_)) => ServiceError::NotFound(body),
        _ => ServiceError::Status {
            status: status.as_u16(),
            body,
        },
    }
}
