//! Second-order extension through auxiliary ontologies
//!
//! A main-ontology value without a direct Wikidata link can still be
//! translated when the link table maps it to an identifier of another
//! ontology (OMIM, MeSH, ...) that Wikidata does know. The labels found for
//! the auxiliary identifier are re-based onto the main value and tagged
//! [`SourceDegree::Second`].
//!
//! ```text
//! main value ──link table──▶ auxiliary id ──aux property──▶ entity labels
//! ```

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::first_order::FirstOrderTranslator;
use super::query::{validate_languages, validate_property};
use crate::config::QueryConfig;
use crate::endpoint::SparqlEndpoint;
use crate::error::{Error, Result};
use crate::models::{
    AuxiliaryFailure, ExtendedRow, ExtendedTable, LabelCell, LinkRecord, LinkTable, SourceDegree,
    TranslationRow, TranslationTable,
};

/// One auxiliary translation to run
#[derive(Debug, Clone)]
struct AuxiliaryPass {
    name: String,
    property: String,
    ids: Vec<String>,
}

/// Extends a main-property translation with labels found one hop away
pub struct SecondOrderExtender<'a, E: SparqlEndpoint + ?Sized> {
    endpoint: &'a E,
    main_property: String,
    links: LinkTable,
    mapping: Vec<(String, String)>,
    languages: Vec<String>,
    query: QueryConfig,
    limit: Option<usize>,
    max_concurrent_auxiliary: Option<usize>,
    all_elem: bool,
    label_fallback: bool,
}

impl<'a, E: SparqlEndpoint + ?Sized> SecondOrderExtender<'a, E> {
    /// Create an extender
    ///
    /// `mapping` pairs an auxiliary property id with the ontology name used
    /// in the link table. Several properties may map to the same name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the main property or the language
    /// list is malformed
    pub fn new(
        endpoint: &'a E,
        main_property: impl Into<String>,
        links: LinkTable,
        mapping: Vec<(String, String)>,
        languages: Vec<String>,
    ) -> Result<Self> {
        let main_property = main_property.into();
        validate_property("main_property", &main_property)?;
        validate_languages(&languages)?;

        Ok(Self {
            endpoint,
            main_property,
            links,
            mapping,
            languages,
            query: QueryConfig::default(),
            limit: None,
            max_concurrent_auxiliary: None,
            all_elem: false,
            label_fallback: true,
        })
    }

    /// Page size of the unrestricted main pass
    ///
    /// Takes precedence over the limit of [`with_query_config`], whichever
    /// is called first.
    ///
    /// [`with_query_config`]: SecondOrderExtender::with_query_config
    pub fn with_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::invalid_input("limit", "must be greater than 0"));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Translate the whole main ontology instead of the linked values only
    pub fn with_all_elem(mut self, all_elem: bool) -> Self {
        self.all_elem = all_elem;
        self
    }

    /// Fill empty main labels with the entity id
    pub fn with_label_fallback(mut self, label_fallback: bool) -> Self {
        self.label_fallback = label_fallback;
        self
    }

    /// Maximum number of auxiliary passes in flight
    ///
    /// Like [`with_limit`], takes precedence over the query configuration.
    ///
    /// [`with_limit`]: SecondOrderExtender::with_limit
    pub fn with_max_concurrent_auxiliary(mut self, max: usize) -> Result<Self> {
        if max == 0 {
            return Err(Error::invalid_input(
                "max_concurrent_auxiliary",
                "must be greater than 0",
            ));
        }
        self.max_concurrent_auxiliary = Some(max);
        Ok(self)
    }

    /// Apply paging, batching, dedup and concurrency settings
    ///
    /// Values set through [`with_limit`] or [`with_max_concurrent_auxiliary`]
    /// are kept.
    ///
    /// [`with_limit`]: SecondOrderExtender::with_limit
    /// [`with_max_concurrent_auxiliary`]: SecondOrderExtender::with_max_concurrent_auxiliary
    pub fn with_query_config(mut self, config: &QueryConfig) -> Result<Self> {
        if config.max_concurrent_auxiliary == 0 {
            return Err(Error::invalid_input(
                "max_concurrent_auxiliary",
                "must be greater than 0",
            ));
        }
        self.query = config.clone();
        Ok(self)
    }

    pub fn main_property(&self) -> &str {
        &self.main_property
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Run the main pass and every auxiliary pass, then combine them
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the link table is empty while `all_elem`
    ///   is off
    /// - `Error::Config` if an ontology of the link table has no mapped
    ///   property or a mapped property id is malformed
    /// - `Error::Endpoint` if the main pass fails
    ///
    /// Failures of auxiliary passes are not errors: they are logged and
    /// listed in [`ExtendedTable::failures`].
    pub async fn translate(&self) -> Result<ExtendedTable> {
        let passes = self.plan_auxiliary()?;
        if !self.all_elem && self.links.is_empty() {
            return Err(Error::invalid_input(
                "link_table",
                "no links to extend while all_elem is off",
            ));
        }

        info!(
            main_property = %self.main_property,
            links = self.links.len(),
            auxiliary_passes = passes.len(),
            all_elem = self.all_elem,
            "Starting second-order translation"
        );

        let main_values = self.links.values();
        let filter = (!self.all_elem).then_some(main_values.as_slice());
        let first = self
            .translator(&self.main_property)?
            .translate(filter)
            .await?;
        info!(rows = first.len(), "Main pass finished");

        let concurrency = self
            .max_concurrent_auxiliary
            .unwrap_or(self.query.max_concurrent_auxiliary)
            .max(1);
        let results: Vec<(AuxiliaryPass, Result<TranslationTable>)> = stream::iter(passes)
            .map(|pass| async move {
                let result = match self.translator(&pass.property) {
                    Ok(translator) => translator.translate(Some(pass.ids.as_slice())).await,
                    Err(e) => Err(e),
                };
                (pass, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        for (pass, result) in results {
            match result {
                Ok(table) => {
                    let before = candidates.len();
                    candidates.extend(self.rebase(&pass.name, &table));
                    debug!(
                        property = %pass.property,
                        name = %pass.name,
                        rows = candidates.len() - before,
                        "Auxiliary pass joined"
                    );
                }
                Err(e) => {
                    warn!(
                        property = %pass.property,
                        name = %pass.name,
                        error = %e,
                        "Auxiliary pass failed, skipping its contribution"
                    );
                    failures.push(AuxiliaryFailure {
                        property: pass.property,
                        name: pass.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut rows: Vec<ExtendedRow> = first.rows.into_iter().map(ExtendedRow::first).collect();
        let first_values: HashSet<String> =
            rows.iter().map(|r| r.value_property().to_string()).collect();

        let mut seen = HashSet::new();
        let before = candidates.len();
        let second: Vec<ExtendedRow> = candidates
            .into_iter()
            .filter(|r| !first_values.contains(r.value_property()))
            .filter(|r| seen.insert(r.clone()))
            .collect();
        debug!(
            candidates = before,
            kept = second.len(),
            "Second-degree candidates filtered"
        );
        rows.extend(second);

        if !self.all_elem {
            let covered: HashSet<String> =
                rows.iter().map(|r| r.value_property().to_string()).collect();
            let mut seen_links = HashSet::new();
            let unresolved: Vec<ExtendedRow> = self
                .links
                .records()
                .iter()
                .filter(|link| !covered.contains(&link.value_property))
                .filter(|link| seen_links.insert(*link))
                .map(|link| self.unresolved_row(link))
                .collect();
            if !unresolved.is_empty() {
                debug!(count = unresolved.len(), "Unresolved links kept with fallback labels");
            }
            rows.extend(unresolved);
        }

        if self.label_fallback {
            for row in &mut rows {
                let fallback = if row.row.entity.is_empty() {
                    row.row.value_property.clone()
                } else {
                    row.row.entity.clone()
                };
                row.row.fill_missing_labels(&fallback);
            }
        }

        let table = ExtendedTable {
            languages: self.languages.clone(),
            rows,
            failures,
        };
        info!(
            rows = table.len(),
            first = table.rows_with_degree(SourceDegree::First).count(),
            second = table.rows_with_degree(SourceDegree::Second).count(),
            failures = table.failures.len(),
            "Second-order translation finished"
        );

        Ok(table)
    }

    /// Check the mapping and list the auxiliary passes, without any query
    fn plan_auxiliary(&self) -> Result<Vec<AuxiliaryPass>> {
        for (property, name) in &self.mapping {
            validate_property("mapping", property).map_err(|_| {
                Error::config(
                    name.as_str(),
                    format!("'{property}' is not a property id"),
                )
            })?;
        }

        let mut passes = Vec::new();
        for name in self.links.auxiliary_names() {
            let properties: Vec<&str> = self
                .mapping
                .iter()
                .filter(|(_, mapped)| *mapped == name)
                .map(|(property, _)| property.as_str())
                .collect();

            if properties.is_empty() {
                return Err(Error::config(
                    name.as_str(),
                    "no auxiliary property is mapped to this ontology",
                ));
            }

            let ids = self.links.auxiliary_ids(&name);
            for property in properties {
                passes.push(AuxiliaryPass {
                    name: name.clone(),
                    property: property.to_string(),
                    ids: ids.clone(),
                });
            }
        }

        Ok(passes)
    }

    fn translator(&self, property: &str) -> Result<FirstOrderTranslator<'a, E>> {
        let translator =
            FirstOrderTranslator::new(self.endpoint, property, self.languages.clone())?
                .with_query_config(&self.query)?;
        match self.limit {
            Some(limit) => translator.with_limit(limit),
            None => Ok(translator),
        }
    }

    /// Attach auxiliary rows to the main values linked to them
    fn rebase(&self, name: &str, table: &TranslationTable) -> Vec<ExtendedRow> {
        let mut rows = Vec::new();
        for link in self.links.records_for(name) {
            for aux in table.rows_for_value(&link.id_auxiliary) {
                let row = TranslationRow {
                    entity: aux.entity.clone(),
                    value_property: link.value_property.clone(),
                    cells: aux.cells.clone(),
                };
                rows.push(ExtendedRow::second(row, link));
            }
        }
        rows
    }

    fn unresolved_row(&self, link: &LinkRecord) -> ExtendedRow {
        let cells = self
            .languages
            .iter()
            .map(|language| LabelCell {
                label: link.value_property.clone(),
                ..LabelCell::empty(language.as_str())
            })
            .collect();

        ExtendedRow::second(
            TranslationRow {
                entity: String::new(),
                value_property: link.value_property.clone(),
                cells,
            },
            link,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointError;
    use crate::models::{LabelBinding, LabelKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers by property id and records queries
    struct PropertyEndpoint {
        answers: Vec<(&'static str, Vec<LabelBinding>)>,
        failing: Vec<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    impl PropertyEndpoint {
        fn new(answers: Vec<(&'static str, Vec<LabelBinding>)>) -> Self {
            Self {
                answers,
                failing: Vec::new(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SparqlEndpoint for PropertyEndpoint {
        async fn execute(
            &self,
            query: &str,
        ) -> std::result::Result<Vec<LabelBinding>, EndpointError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.failing.iter().any(|p| query.contains(&format!("wdt:{p} "))) {
                return Err(EndpointError::Timeout);
            }
            Ok(self
                .answers
                .iter()
                .find(|(p, _)| query.contains(&format!("wdt:{p} ")))
                .map(|(_, bindings)| bindings.clone())
                .unwrap_or_default())
        }
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn mapping(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(p, n)| (p.to_string(), n.to_string()))
            .collect()
    }

    fn omim_links() -> LinkTable {
        LinkTable::new(vec![LinkRecord::new("1551", "121270", "OMIM")])
    }

    #[tokio::test]
    async fn test_copper_deficiency_via_omim() {
        let endpoint = PropertyEndpoint::new(vec![(
            "P492",
            vec![LabelBinding::label(
                "Q1495005",
                "121270",
                "fr",
                LabelKind::Main,
                "carence en cuivre",
            )],
        )]);

        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P492", "OMIM")]),
            langs(&["cs", "fr"]),
        )
        .unwrap();

        let table = extender.translate().await.unwrap();

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.entity(), "Q1495005");
        assert_eq!(row.value_property(), "1551");
        assert_eq!(row.row.label("cs"), "Q1495005");
        assert_eq!(row.row.alt("cs"), "");
        assert_eq!(row.row.label("fr"), "carence en cuivre");
        assert_eq!(row.row.alt("fr"), "");
        assert_eq!(row.id_auxiliary.as_deref(), Some("121270"));
        assert_eq!(row.name_auxiliary.as_deref(), Some("OMIM"));
        assert_eq!(row.source_degree, SourceDegree::Second);
        assert!(table.failures.is_empty());
    }

    #[tokio::test]
    async fn test_missing_mapping_fails_before_query() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P486", "MeSH")]),
            langs(&["fr"]),
        )
        .unwrap();

        let err = extender.translate().await.unwrap_err();
        assert!(matches!(err, Error::Config { ref name, .. } if name == "OMIM"));
        assert_eq!(endpoint.query_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_mapping_property() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("OMIM", "P492")]),
            langs(&["fr"]),
        )
        .unwrap();

        assert!(matches!(
            extender.translate().await,
            Err(Error::Config { .. })
        ));
        assert_eq!(endpoint.query_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_links_rejected_without_all_elem() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            LinkTable::default(),
            Vec::new(),
            langs(&["fr"]),
        )
        .unwrap();

        let err = extender.translate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(endpoint.query_count(), 0);
    }

    #[tokio::test]
    async fn test_main_pass_failure_is_fatal() {
        let mut endpoint = PropertyEndpoint::new(Vec::new());
        endpoint.failing.push("P699");
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P492", "OMIM")]),
            langs(&["fr"]),
        )
        .unwrap();

        assert!(matches!(
            extender.translate().await,
            Err(Error::Endpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_unresolved_link_keeps_value() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P492", "OMIM")]),
            langs(&["en", "fr"]),
        )
        .unwrap();

        let table = extender.translate().await.unwrap();
        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.entity(), "");
        assert_eq!(row.row.label("en"), "1551");
        assert_eq!(row.row.label("fr"), "1551");
        assert_eq!(row.source_degree, SourceDegree::Second);
    }

    #[tokio::test]
    async fn test_without_label_fallback() {
        let endpoint = PropertyEndpoint::new(vec![(
            "P492",
            vec![LabelBinding::label("Q1", "121270", "fr", LabelKind::Main, "un")],
        )]);
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P492", "OMIM")]),
            langs(&["cs", "fr"]),
        )
        .unwrap()
        .with_label_fallback(false);

        let table = extender.translate().await.unwrap();
        assert_eq!(table.rows[0].row.label("cs"), "");
    }

    #[tokio::test]
    async fn test_repeated_unresolved_link_yields_one_row() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let links = LinkTable::new(vec![
            LinkRecord::new("1551", "121270", "OMIM"),
            LinkRecord::new("1551", "121270", "OMIM"),
        ]);
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            links,
            mapping(&[("P492", "OMIM")]),
            langs(&["fr"]),
        )
        .unwrap();

        let table = extender.translate().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].value_property(), "1551");
    }

    #[tokio::test]
    async fn test_limit_survives_query_config() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            LinkTable::default(),
            Vec::new(),
            langs(&["fr"]),
        )
        .unwrap()
        .with_all_elem(true)
        .with_limit(2)
        .unwrap()
        .with_query_config(&QueryConfig::default())
        .unwrap();

        extender.translate().await.unwrap();

        let queries = endpoint.queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("LIMIT 2 OFFSET 0"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let endpoint = PropertyEndpoint::new(Vec::new());
        let extender = SecondOrderExtender::new(
            &endpoint,
            "P699",
            omim_links(),
            mapping(&[("P492", "OMIM")]),
            langs(&["fr"]),
        )
        .unwrap();
        assert!(extender.with_max_concurrent_auxiliary(0).is_err());
    }
}
