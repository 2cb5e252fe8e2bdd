//! # HTTP Retrieval Utilities
//!
//! Asynchronous JSON client over `reqwest`. Retries with exponential backoff
//! are opt-in per client: a client built with `max_retries == 0` sends every
//! request exactly once, which is what non-idempotent commands need.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

/// Outcome of one HTTP exchange that produced a response.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// Deserialized body of a 2xx response. `None` when the body was empty.
    pub data: Option<T>,
    /// Raw body of a non-2xx response.
    pub error_body: Option<String>,
    /// Numeric HTTP status.
    pub status: u16,
    /// True for 2xx.
    pub success: bool,
}

/// JSON API client bound to a base URL.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Absolute URL relative paths are joined onto. Keep the trailing `/`.
    /// * `max_retries` - Transient-failure retries; `0` disables the retry middleware.
    /// * `timeout` - Per-request timeout.
    ///
    /// # Errors
    /// Fails when `base_url` is not absolute or the TLS backend cannot be initialised.
    pub fn new(base_url: &str, max_retries: u32, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let mut builder = ClientBuilder::new(client);
        if max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            inner: builder.build(),
            base_url,
        })
    }

    /// Base URL every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `method path` with an optional JSON body.
    ///
    /// Non-2xx statuses are not errors: they come back with `success == false`
    /// and the raw body in `error_body`.
    ///
    /// # Errors
    /// URL joining, body serialization, network failures, and a 2xx body that
    /// is not valid JSON for `T`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        log::debug!("{} {}", method, url);
        let mut req = self.inner.request(method, url).header(ACCEPT, "application/json");

        if let Some(b) = body {
            req = req.header(CONTENT_TYPE, "application/json").body(serde_json::to_string(b)?);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let data = if text.trim().is_empty() {
                None
            } else {
                Some(serde_json::from_str::<T>(&text)?)
            };
            Ok(ApiResponse {
                data,
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            log::debug!("{} answered {}: {}", self.base_url, status, text);
            Ok(ApiResponse {
                data: None,
                error_body: Some(text),
                status: status.as_u16(),
                success: false,
            })
        }
    }

    /// GET without a body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<ApiResponse<T>> {
        self.request::<T, ()>(Method::GET, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_base_url() {
        assert!(ApiClient::new("api/orders", 0, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_base_url_joins_relative_paths() {
        let client = ApiClient::new("http://localhost:8080/", 3, Duration::from_secs(1)).unwrap();
        let joined = client.base_url().join("api/orders/statistics").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:8080/api/orders/statistics");
    }
}
