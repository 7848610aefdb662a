//! wikilabel - Multilingual labels for ontology identifiers from Wikidata
//!
//! Given a Wikidata property that stores the identifiers of an external
//! ontology (Disease Ontology, OMIM, INSEE codes, ...), wikilabel collects
//! the main and alternate labels of every linked entity in a list of
//! languages and lays them out as one row per (entity, value) pair.
//!
//! # Architecture
//!
//! - [`config`] - Endpoint, query and logging settings
//! - [`endpoint`] - SPARQL endpoint trait and HTTP client
//! - [`translation`] - Query building, result merging, first and second order
//! - [`postprocess`] - Per-value label summaries
//! - [`models`] - Bindings, rows, tables and link records
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use wikilabel::config::Config;
//! use wikilabel::endpoint::WikidataClient;
//! use wikilabel::translation::FirstOrderTranslator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = WikidataClient::new(&config.endpoint)?;
//!
//!     let translator = FirstOrderTranslator::new(
//!         &client,
//!         "P2586",
//!         vec!["pl".to_string(), "fr".to_string()],
//!     )?;
//!     let ids: Vec<String> = vec!["01".into(), "02".into()];
//!     let table = translator.translate(Some(ids.as_slice())).await?;
//!     println!("{}", serde_json::to_string_pretty(&table)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod postprocess;
pub mod translation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::endpoint::{SparqlEndpoint, WikidataClient};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        ExtendedRow, ExtendedTable, LinkRecord, LinkTable, SourceDegree, TranslationRow,
        TranslationTable,
    };
    pub use crate::postprocess::{translations_only, ValueTranslations};
    pub use crate::translation::{FirstOrderTranslator, SecondOrderExtender};
}

pub use models::{ExtendedTable, LinkRecord, LinkTable, TranslationTable};
