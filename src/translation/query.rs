//! SPARQL query construction
//!
//! One query covers every requested language. The inner sub-select scopes
//! the (entity, value) pairs, either through a `VALUES` block holding one
//! batch of identifiers or through an `ORDER BY`/`LIMIT`/`OFFSET` window.
//! The label part is `OPTIONAL`, so every scoped pair comes back at least
//! once even when it has no label in any requested language.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::LabelKind;

/// Default number of (entity, value) pairs per page
pub const DEFAULT_LIMIT: usize = 5000;

/// Default number of identifiers per `VALUES` batch
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Default character budget of one rendered `VALUES` batch
pub const DEFAULT_MAX_BATCH_CHARS: usize = 6000;

static PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P[1-9][0-9]*$").expect("Invalid regex pattern"));

static LANGUAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+(-[A-Za-z0-9]+)*$").expect("Invalid regex pattern"));

/// Check that `property` is a Wikidata property id (`P` followed by digits)
pub fn validate_property(argument: &str, property: &str) -> Result<()> {
    if PROPERTY_REGEX.is_match(property) {
        Ok(())
    } else {
        Err(Error::invalid_input(
            argument,
            format!("expected a property id like 'P699', got '{property}'"),
        ))
    }
}

/// Check that the language list is non-empty, made of language codes and
/// free of repeats
///
/// Codes are compared case-insensitively, as they are in queries.
pub fn validate_languages(languages: &[String]) -> Result<()> {
    if languages.is_empty() {
        return Err(Error::invalid_input("languages", "at least one language is required"));
    }

    if let Some(bad) = languages.iter().find(|l| !LANGUAGE_REGEX.is_match(l)) {
        return Err(Error::invalid_input(
            "languages",
            format!("'{bad}' is not a language code"),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(repeated) = languages.iter().find(|l| !seen.insert(l.to_lowercase())) {
        return Err(Error::invalid_input(
            "languages",
            format!("'{repeated}' is requested more than once"),
        ));
    }

    Ok(())
}

/// Escape a string for use inside a double-quoted SPARQL literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn values_row(id: &str) -> String {
    format!("(\"{}\")", escape_literal(id))
}

/// Where a query draws its (entity, value) pairs from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope<'a> {
    /// Only the given identifiers
    Values(&'a [String]),
    /// A window over every pair of the property
    Page { offset: usize },
}

/// Builds label queries for one property and language list
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    property: String,
    languages: Vec<String>,
    limit: usize,
    batch_size: usize,
    max_batch_chars: usize,
}

impl QueryBuilder {
    /// Create a builder
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `property` is empty or `languages`
    /// is empty, malformed or repeats a code
    pub fn new(property: impl Into<String>, languages: Vec<String>) -> Result<Self> {
        let property = property.into();
        if property.trim().is_empty() {
            return Err(Error::invalid_input("property", "must not be empty"));
        }
        validate_languages(&languages)?;

        Ok(Self {
            property,
            languages,
            limit: DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            max_batch_chars: DEFAULT_MAX_BATCH_CHARS,
        })
    }

    /// Set the page size used without an identifier filter
    pub fn with_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::invalid_input("limit", "must be greater than 0"));
        }
        self.limit = limit;
        Ok(self)
    }

    /// Set the maximum number of identifiers per batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_input("batch_size", "must be greater than 0"));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Set the character budget of one rendered batch
    pub fn with_max_batch_chars(mut self, max_batch_chars: usize) -> Result<Self> {
        if max_batch_chars == 0 {
            return Err(Error::invalid_input("max_batch_chars", "must be greater than 0"));
        }
        self.max_batch_chars = max_batch_chars;
        Ok(self)
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Split identifiers into batches bounded by count and rendered size
    ///
    /// An identifier larger than the character budget still gets a batch of
    /// its own.
    pub fn batches<'a>(&self, ids: &'a [String]) -> Vec<&'a [String]> {
        let mut batches = Vec::new();
        let mut start = 0;
        let mut chars = 0;

        for (idx, id) in ids.iter().enumerate() {
            let len = values_row(id).len() + 1;
            let count = idx - start;
            if count > 0 && (count == self.batch_size || chars + len > self.max_batch_chars) {
                batches.push(&ids[start..idx]);
                start = idx;
                chars = 0;
            }
            chars += len;
        }

        if start < ids.len() {
            batches.push(&ids[start..]);
        }

        batches
    }

    /// Queries for an optional identifier filter
    ///
    /// An empty filter behaves like no filter.
    pub fn plan<'a>(&'a self, filter: Option<&'a [String]>) -> QueryPlan<'a> {
        match filter {
            Some(ids) if !ids.is_empty() => QueryPlan::Batches(
                self.batches(ids)
                    .into_iter()
                    .map(|batch| self.render(QueryScope::Values(batch)))
                    .collect(),
            ),
            _ => QueryPlan::Pages(PageQueries {
                builder: self,
                next_offset: 0,
            }),
        }
    }

    /// Render the query for one scope
    pub fn render(&self, scope: QueryScope<'_>) -> String {
        let languages = self
            .languages
            .iter()
            .map(|l| format!("\"{}\"", escape_literal(&l.to_lowercase())))
            .collect::<Vec<_>>()
            .join(", ");

        let (values, window) = match scope {
            QueryScope::Values(ids) => {
                let rows = ids
                    .iter()
                    .map(|id| values_row(id))
                    .collect::<Vec<_>>()
                    .join("\n            ");
                (
                    format!("VALUES (?value_property) {{\n            {rows}\n          }}\n          "),
                    String::new(),
                )
            }
            QueryScope::Page { offset } => (
                String::new(),
                format!(
                    "\n        ORDER BY ?entity ?value_property\n        LIMIT {} OFFSET {offset}",
                    self.limit
                ),
            ),
        };

        format!(
            r#"SELECT ?entity ?value_property ?language ?kind ?text
WHERE {{
  {{
    SELECT DISTINCT ?entity ?value_property
    WHERE {{
          {values}?entity wdt:{property} ?value_property .
    }}{window}
  }}
  OPTIONAL {{
    {{
      ?entity rdfs:label ?text .
      BIND("{main}" AS ?kind)
    }} UNION {{
      ?entity skos:altLabel ?text .
      BIND("{alt}" AS ?kind)
    }}
    BIND(LCASE(LANG(?text)) AS ?language)
    FILTER(?language IN ({languages}))
  }}
}}
ORDER BY ?entity ?value_property"#,
            property = self.property,
            main = LabelKind::Main.as_str(),
            alt = LabelKind::Alt.as_str(),
        )
    }
}

/// Sequence of queries for one translation
#[derive(Debug)]
pub enum QueryPlan<'a> {
    /// One query per identifier batch
    Batches(Vec<String>),
    /// Open-ended page queries; the caller stops on a short page
    Pages(PageQueries<'a>),
}

/// Endless iterator of `(offset, query)` page queries
#[derive(Debug, Clone)]
pub struct PageQueries<'a> {
    builder: &'a QueryBuilder,
    next_offset: usize,
}

impl Iterator for PageQueries<'_> {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_offset;
        self.next_offset += self.builder.limit;
        Some((offset, self.builder.render(QueryScope::Page { offset })))
    }
}
