use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::storage::KeyValueStore;
use super::TOKEN_KEY;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API rejected the session token.")]
    Unauthorized,
    #[error("API answered {0}: {1}")]
    Status(u16, String),
}

/// True when `err` carries an HTTP 401 from the portal API.
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized))
}

/// JSON client for the portal REST API.
///
/// Every request carries the persisted session token as a bearer token, when
/// one exists.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Could not build HTTP client.")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            store,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, anyhow::Error> {
        let request = self.request(Method::GET, path).await?;
        Self::send(request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, anyhow::Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).await?.json(body);
        Self::send(request).await
    }

    pub async fn patch(&self, path: &str) -> Result<(), anyhow::Error> {
        let request = self.request(Method::PATCH, path).await?;
        Self::check(request.send().await?).await?;

        Ok(())
    }

    /// Raw response body together with its content type.
    pub async fn download(&self, path: &str) -> Result<(String, Vec<u8>), anyhow::Error> {
        let request = self.request(Method::GET, path).await?;
        let response = Self::check(request.send().await?).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;

        Ok((content_type, bytes.to_vec()))
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, anyhow::Error> {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);

        match self.store.get(TOKEN_KEY).await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, anyhow::Error> {
        let response = Self::check(request.send().await?).await?;
        let body = response.json::<T>().await?;

        Ok(body)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, anyhow::Error> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("API rejected request to {}", response.url());
            return Err(ApiError::Unauthorized.into());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), body).into());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_recognized_through_anyhow() {
        let err: anyhow::Error = ApiError::Unauthorized.into();
        assert!(is_unauthorized(&err));

        let err: anyhow::Error = ApiError::Status(500, "boom".to_string()).into();
        assert!(!is_unauthorized(&err));

        assert!(!is_unauthorized(&anyhow::anyhow!("Unauthorized")));
    }
}
