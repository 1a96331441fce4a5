//! HTTP client shared by the endoflife.date source
//!
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on transport errors and HTTP 429
//! - 404 is reported as "absent" rather than an error

use crate::error::ResolutionError;
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("eol-check/", env!("CARGO_PKG_VERSION"));

const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
    max_retries: u32,
}

impl HttpClient {
    pub fn new() -> Result<Self, ResolutionError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, ResolutionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ResolutionError::network("", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            timeout,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sends a request with retry; `Ok(None)` means the server answered 404
    async fn send(
        &self,
        method: Method,
        url: &str,
        product: &str,
    ) -> Result<Option<Response>, ResolutionError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            debug!("{} {} (attempt {})", method, url, attempt + 1);
            match self.client.request(method.clone(), url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ResolutionError::RateLimitExceeded {
                            product: product.to_string(),
                        });
                    } else if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    } else if !status.is_success() {
                        return Err(ResolutionError::network(product, format!("HTTP {}", status)));
                    } else {
                        return Ok(Some(response));
                    }
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(ResolutionError::timeout(product, self.timeout));
                }
                Err(e) => {
                    last_error = Some(ResolutionError::network(product, e.to_string()));
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| ResolutionError::network(product, "unknown error")))
    }

    /// GET `url` and decode the body as JSON; `Ok(None)` on 404
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        product: &str,
    ) -> Result<Option<T>, ResolutionError> {
        let Some(response) = self.send(Method::GET, url, product).await? else {
            return Ok(None);
        };

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| {
                ResolutionError::invalid_response(product, format!("failed to parse JSON: {}", e))
            })
    }

    /// HEAD `url`: true on success, false on 404
    pub async fn exists(&self, url: &str, product: &str) -> Result<bool, ResolutionError> {
        Ok(self.send(Method::HEAD, url, product).await?.is_some())
    }
}
