//! HTTP client for Wikidata-compatible SPARQL endpoints
//!
//! Features:
//! - Explicit `User-Agent` configuration (no process-wide state)
//! - Client-side throttling with governor
//! - Status codes mapped to [`EndpointError`] variants
//!
//! There is no retry loop: a 429 or 403 is returned to the caller as is.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use std::num::NonZeroU32;

use super::error::EndpointError;
use super::headers::build_sparql_headers;
use super::response::parse_bindings;
use super::SparqlEndpoint;
use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::models::LabelBinding;

/// SPARQL endpoint reached over HTTP
pub struct WikidataClient {
    /// HTTP client with the identifying headers preset
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Endpoint URL
    url: String,
}

impl WikidataClient {
    /// Create a client from endpoint configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .default_headers(build_sparql_headers(&config.user_agent)?)
            .timeout(config.request_timeout())
            .gzip(true)
            .build()
            .map_err(|e| Error::config("endpoint", format!("failed to create HTTP client: {e}")))?;

        let rate = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            Error::config("endpoint.requests_per_second", "must be greater than 0")
        })?;
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            url: config.url.clone(),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, query: &str) -> std::result::Result<String, EndpointError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(url = %self.url, query_len = query.len(), "Sending SPARQL query");

        let response = self
            .client
            .get(&self.url)
            .query(&[("query", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EndpointError::Timeout
                } else {
                    EndpointError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                EndpointError::Timeout
            } else {
                EndpointError::Http(e)
            }
        })?;

        if !status.is_success() {
            let err = EndpointError::from_status(status.as_u16(), &body);
            tracing::error!(status = status.as_u16(), error = %err, "SPARQL request failed");
            return Err(err);
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl SparqlEndpoint for WikidataClient {
    async fn execute(&self, query: &str) -> std::result::Result<Vec<LabelBinding>, EndpointError> {
        let body = self.send(query).await?;
        let bindings = parse_bindings(&body)?;
        tracing::debug!(bindings = bindings.len(), "SPARQL results decoded");
        Ok(bindings)
    }
}
