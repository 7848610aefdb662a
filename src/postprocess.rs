//! Reduce translation tables to the labels of each value
//!
//! An ontology value can be reached through several entities, and in second
//! order through several auxiliary links. [`translations_only`] drops the
//! provenance and keeps one row per value, where each cell holds every
//! distinct label found for it.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    alt_column, label_column, ExtendedTable, LabelCell, TranslationRow, TranslationTable,
    LABEL_DELIMITER,
};

/// Labels of one ontology value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTranslation {
    pub value_property: String,
    pub cells: Vec<LabelCell>,
}

impl ValueTranslation {
    pub fn label(&self, language: &str) -> &str {
        self.cells
            .iter()
            .find(|c| c.language == language)
            .map(|c| c.label.as_str())
            .unwrap_or("")
    }

    pub fn alt(&self, language: &str) -> &str {
        self.cells
            .iter()
            .find(|c| c.language == language)
            .map(|c| c.alt.as_str())
            .unwrap_or("")
    }
}

impl Serialize for ValueTranslation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + 2 * self.cells.len()))?;
        map.serialize_entry("value_property", &self.value_property)?;
        for cell in &self.cells {
            map.serialize_entry(&label_column(&cell.language), &cell.label)?;
            map.serialize_entry(&alt_column(&cell.language), &cell.alt)?;
        }
        map.end()
    }
}

/// Translations keyed by value, ordered by value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTranslations {
    pub languages: Vec<String>,
    pub rows: Vec<ValueTranslation>,
}

impl ValueTranslations {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, value_property: &str) -> Option<&ValueTranslation> {
        self.rows.iter().find(|r| r.value_property == value_property)
    }
}

impl Serialize for ValueTranslations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

static ENTITY_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q[0-9]+$").expect("Invalid regex pattern"));

fn is_entity_id(part: &str) -> bool {
    ENTITY_ID_REGEX.is_match(part)
}

#[derive(Default)]
struct Parts {
    label: BTreeSet<String>,
    alt: BTreeSet<String>,
}

/// Whether `part` only stands in for a missing label of `row`
fn is_placeholder(row: &TranslationRow, part: &str) -> bool {
    part.is_empty()
        || is_entity_id(part)
        || part == row.value_property
        || (!row.entity.is_empty() && part == row.entity)
}

fn collect_parts(target: &mut BTreeSet<String>, row: &TranslationRow, cell: &str) {
    target.extend(
        cell.split(LABEL_DELIMITER)
            .filter(|part| !is_placeholder(row, part))
            .map(str::to_string),
    );
}

fn join(parts: BTreeSet<String>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(LABEL_DELIMITER)
}

/// Group rows by value and union their labels
///
/// Placeholders standing in for a missing label are removed: entity ids and
/// the row's own value. Within each cell, labels are deduplicated and
/// sorted.
pub fn translations_only<'a>(
    languages: &[String],
    rows: impl IntoIterator<Item = &'a TranslationRow>,
) -> ValueTranslations {
    let mut groups: BTreeMap<&'a str, Vec<Parts>> = BTreeMap::new();

    for row in rows {
        let parts = groups
            .entry(row.value_property.as_str())
            .or_insert_with(|| languages.iter().map(|_| Parts::default()).collect());

        for (language, target) in languages.iter().zip(parts.iter_mut()) {
            if let Some(cell) = row.cell(language) {
                collect_parts(&mut target.label, row, &cell.label);
                collect_parts(&mut target.alt, row, &cell.alt);
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|(value_property, parts)| ValueTranslation {
            value_property: value_property.to_string(),
            cells: languages
                .iter()
                .zip(parts)
                .map(|(language, parts)| LabelCell {
                    language: language.clone(),
                    label: join(parts.label),
                    alt: join(parts.alt),
                })
                .collect(),
        })
        .collect();

    ValueTranslations {
        languages: languages.to_vec(),
        rows,
    }
}

impl TranslationTable {
    /// See [`translations_only`]
    pub fn translations_only(&self) -> ValueTranslations {
        translations_only(&self.languages, &self.rows)
    }
}

impl ExtendedTable {
    /// See [`translations_only`]
    pub fn translations_only(&self) -> ValueTranslations {
        translations_only(&self.languages, self.rows.iter().map(|r| &r.row))
    }
}
