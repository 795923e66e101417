//! `reqwest`-backed HTTP transport

use dynform_core::environment::{HttpClient, HttpFuture, HttpResponse, TransportError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use url::Url;

/// HTTP client resolving paths against the page origin.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
}

impl ReqwestHttpClient {
    /// Create a client for pages served from `base_url`
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client around a preconfigured `reqwest::Client`
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Base URL paths are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, target: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(target)
            .map_err(|e| TransportError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            })
    }

    async fn execute(request: RequestBuilder) -> Result<HttpResponse, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: String) -> HttpFuture<'_> {
        Box::pin(async move {
            let url = self.resolve(&url)?;
            tracing::debug!(%url, "GET");
            Self::execute(self.client.get(url)).await
        })
    }

    fn post_json(&self, url: String, body: serde_json::Value) -> HttpFuture<'_> {
        Box::pin(async move {
            let url = self.resolve(&url)?;
            tracing::debug!(%url, "POST");
            Self::execute(
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body),
            )
            .await
        })
    }
}
