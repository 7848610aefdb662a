//! Label extraction for a single property

use std::collections::HashSet;

use tracing::{debug, info};

use super::merge::{distinct_pairs, MergeOptions, ResultMerger};
use super::query::{validate_languages, validate_property, QueryBuilder, QueryPlan};
use crate::config::QueryConfig;
use crate::endpoint::SparqlEndpoint;
use crate::error::{Error, Result};
use crate::models::{LabelBinding, TranslationTable};

/// Extracts the labels of every entity carrying one property
///
/// The translator only holds its configuration; each [`translate`] call
/// owns its own accumulation state.
///
/// [`translate`]: FirstOrderTranslator::translate
pub struct FirstOrderTranslator<'a, E: SparqlEndpoint + ?Sized> {
    endpoint: &'a E,
    builder: QueryBuilder,
    options: MergeOptions,
}

impl<'a, E: SparqlEndpoint + ?Sized> FirstOrderTranslator<'a, E> {
    /// Create a translator for `property` and `languages`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the property is not a `P<digits>` id
    /// or the language list is empty or malformed
    pub fn new(endpoint: &'a E, property: impl Into<String>, languages: Vec<String>) -> Result<Self> {
        let property = property.into();
        validate_property("property", &property)?;
        validate_languages(&languages)?;

        Ok(Self {
            endpoint,
            builder: QueryBuilder::new(property, languages)?,
            options: MergeOptions::default(),
        })
    }

    /// Set the number of pairs per page for full extraction
    pub fn with_limit(mut self, limit: usize) -> Result<Self> {
        self.builder = self.builder.with_limit(limit)?;
        Ok(self)
    }

    /// Set the maximum identifiers per batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        self.builder = self.builder.with_batch_size(batch_size)?;
        Ok(self)
    }

    /// Set the character budget of one batch
    pub fn with_max_batch_chars(mut self, max_batch_chars: usize) -> Result<Self> {
        self.builder = self.builder.with_max_batch_chars(max_batch_chars)?;
        Ok(self)
    }

    /// Remove repeated labels inside a cell
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.options.dedup = dedup;
        self
    }

    /// Apply paging, batching and dedup settings from configuration
    pub fn with_query_config(self, config: &QueryConfig) -> Result<Self> {
        Ok(self
            .with_limit(config.limit)?
            .with_batch_size(config.batch_size)?
            .with_max_batch_chars(config.max_batch_chars)?
            .with_dedup(config.dedup_labels))
    }

    pub fn property(&self) -> &str {
        self.builder.property()
    }

    pub fn languages(&self) -> &[String] {
        self.builder.languages()
    }

    /// Extract labels, optionally restricted to `id_list`
    ///
    /// Without a list, the whole property is paged through until a page
    /// holds fewer pairs than the limit. With a list, repeated identifiers
    /// are dropped and the rest are queried batch by batch. Every page or batch is folded into a single merger, so
    /// pairs repeated across pages or batches end up in one row.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if `id_list` is empty
    /// - `Error::Endpoint` on the first failing query; nothing is retried
    pub async fn translate(&self, id_list: Option<&[String]>) -> Result<TranslationTable> {
        if matches!(id_list, Some(ids) if ids.is_empty()) {
            return Err(Error::invalid_input("id_list", "nothing to query"));
        }

        let ids = id_list.map(distinct_ids);
        let mut merger = ResultMerger::with_options(self.languages().to_vec(), self.options);

        match self.builder.plan(ids.as_deref()) {
            QueryPlan::Batches(queries) => {
                let total = queries.len();
                info!(
                    property = %self.property(),
                    ids = ids.as_ref().map_or(0, Vec::len),
                    batches = total,
                    "Starting batched translation"
                );

                for (idx, query) in queries.into_iter().enumerate() {
                    let bindings = self.run(query).await?;
                    debug!(batch = idx + 1, total, bindings = bindings.len(), "Batch fetched");
                    merger.extend(bindings);
                }
            }
            QueryPlan::Pages(pages) => {
                let limit = self.builder.limit();
                info!(property = %self.property(), limit, "Starting full-property translation");

                for (offset, query) in pages {
                    let bindings = self.run(query).await?;
                    let pairs = distinct_pairs(&bindings);
                    debug!(offset, pairs, bindings = bindings.len(), "Page fetched");
                    merger.extend(bindings);

                    if pairs < limit {
                        break;
                    }
                }
            }
        }

        let pairs = merger.pairs();
        let table = merger.finish();
        info!(
            property = %self.property(),
            pairs,
            rows = table.len(),
            "Translation finished"
        );

        Ok(table)
    }

    async fn run(&self, query: String) -> Result<Vec<LabelBinding>> {
        debug!(property = %self.property(), "Executing query");
        match self.endpoint.execute(&query).await {
            Ok(bindings) => Ok(bindings),
            Err(source) => Err(Error::endpoint(query, source)),
        }
    }
}

fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}
