//! Decoding of SPARQL 1.1 JSON results into label bindings

use serde::Deserialize;
use std::collections::HashMap;

use super::error::EndpointError;
use crate::models::{LabelBinding, LabelKind};

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    bindings: Vec<HashMap<String, Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
}

/// Compact an entity URI to its local name
///
/// `http://www.wikidata.org/entity/Q51993` becomes `Q51993`; anything that
/// is not an http(s) URI is returned unchanged.
pub fn compact_entity(uri: &str) -> &str {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        uri.rsplit(|c: char| c == '/' || c == '#').next().unwrap_or(uri)
    } else {
        uri
    }
}

/// Parse a `application/sparql-results+json` body
///
/// Expected variables: `entity`, `value_property`, and optionally `language`,
/// `kind` and `text`. When `language` is unbound the `xml:lang` tag of
/// `text` is used.
pub fn parse_bindings(body: &str) -> Result<Vec<LabelBinding>, EndpointError> {
    let results: SparqlResults = serde_json::from_str(body)
        .map_err(|e| EndpointError::Decode(format!("invalid SPARQL JSON: {e}")))?;

    results
        .results
        .bindings
        .into_iter()
        .enumerate()
        .map(|(idx, mut row)| to_label_binding(idx, &mut row))
        .collect()
}

fn to_label_binding(
    idx: usize,
    row: &mut HashMap<String, Term>,
) -> Result<LabelBinding, EndpointError> {
    let entity = row
        .remove("entity")
        .ok_or_else(|| EndpointError::Decode(format!("binding {idx} has no ?entity")))?;
    let value_property = row
        .remove("value_property")
        .ok_or_else(|| EndpointError::Decode(format!("binding {idx} has no ?value_property")))?;

    let text = row.remove("text");
    let kind = match row.remove("kind") {
        Some(term) => Some(LabelKind::parse(&term.value).ok_or_else(|| {
            EndpointError::Decode(format!("binding {idx} has unknown ?kind '{}'", term.value))
        })?),
        None => None,
    };

    let (kind, language, text) = match (kind, text) {
        (Some(kind), Some(text)) => {
            let language = row
                .remove("language")
                .map(|t| t.value)
                .or(text.lang)
                .ok_or_else(|| {
                    EndpointError::Decode(format!("binding {idx} has a label without language"))
                })?;
            (Some(kind), Some(language), Some(text.value))
        }
        (None, None) => (None, None, None),
        _ => {
            return Err(EndpointError::Decode(format!(
                "binding {idx} binds only one of ?kind and ?text"
            )))
        }
    };

    Ok(LabelBinding {
        entity: compact_entity(&entity.value).to_string(),
        value_property: value_property.value,
        language,
        kind,
        text,
    })
}
