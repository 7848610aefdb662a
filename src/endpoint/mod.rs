//! SPARQL endpoint access
//!
//! The translation engine only depends on the [`SparqlEndpoint`] trait:
//! a query string goes in, an ordered list of [`LabelBinding`] tuples comes
//! out. [`WikidataClient`] is the HTTP implementation used in production;
//! tests plug in fakes.
//!
//! Failures are surfaced as [`EndpointError`] and never retried at this
//! layer.

pub mod client;
pub mod error;
pub mod headers;
pub mod response;

use async_trait::async_trait;

pub use crate::models::{LabelBinding, LabelKind};
pub use client::WikidataClient;
pub use error::EndpointError;

/// Default public Wikidata SPARQL endpoint
pub const WIKIDATA_SPARQL_URL: &str = "https://query.wikidata.org/sparql";

/// Something that can run a label query
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Execute `query` and return its bindings in response order
    async fn execute(&self, query: &str) -> Result<Vec<LabelBinding>, EndpointError>;
}

#[async_trait]
impl<T: SparqlEndpoint + ?Sized> SparqlEndpoint for std::sync::Arc<T> {
    async fn execute(&self, query: &str) -> Result<Vec<LabelBinding>, EndpointError> {
        (**self).execute(query).await
    }
}
