use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Supplies the bearer token attached to every call.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Invoked once per 401 response, before the error reaches the caller.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    async fn on_unauthorized(&self);
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSupplier for StaticToken {
    async fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

struct NoToken;

#[async_trait]
impl TokenSupplier for NoToken {
    async fn access_token(&self) -> Option<String> {
        None
    }
}

struct LogUnauthorized;

#[async_trait]
impl UnauthorizedHandler for LogUnauthorized {
    async fn on_unauthorized(&self) {
        tracing::debug!("marketplace API rejected the access token");
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
    #[error("request was not authorized")]
    Unauthorized,
    #[error("API responded {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub struct ApiClientBuilder {
    base_url: String,
    token_supplier: Arc<dyn TokenSupplier>,
    unauthorized_handler: Arc<dyn UnauthorizedHandler>,
    timeout: Duration,
}

impl ApiClientBuilder {
    pub fn token_supplier(mut self, supplier: Arc<dyn TokenSupplier>) -> Self {
        self.token_supplier = supplier;
        self
    }

    pub fn unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized_handler = handler;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(self.base_url));
        }

        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(ApiClient {
            http,
            base_url,
            token_supplier: self.token_supplier,
            unauthorized_handler: self.unauthorized_handler,
        })
    }
}

/// ApiClient
///
/// One client for every marketplace resource: the base URL, token source and
/// 401 handling are configured once instead of per resource.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token_supplier: Arc<dyn TokenSupplier>,
    unauthorized_handler: Arc<dyn UnauthorizedHandler>,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            token_supplier: Arc::new(NoToken),
            unauthorized_handler: Arc::new(LogUnauthorized),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(Method::DELETE, path, None).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method.clone(), self.url(path));

        if let Some(token) = self.token_supplier.access_token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.unauthorized_handler.on_unauthorized().await;
            return Err(ApiError::Unauthorized);
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::debug!(%method, path, %status, %message, "marketplace API call failed");
            return Err(ApiError::Status { status, message });
        }

        // Bodyless success (e.g. 204) decodes as JSON null so `()` and `Option<_>` work.
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
