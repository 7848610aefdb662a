// Core data structures for wikilabel tables

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// Delimiter used to join multiple labels inside one cell
pub const LABEL_DELIMITER: &str = "|";

/// Kind of label carried by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// `rdfs:label`
    Main,
    /// `skos:altLabel`
    Alt,
}

impl LabelKind {
    /// Literal used for `?kind` in queries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Alt => "alt",
        }
    }

    /// Parse the `?kind` literal returned by the endpoint
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }
}

/// One raw tuple returned by the endpoint
///
/// A binding without `language`/`kind`/`text` only records that the
/// (entity, value) pair exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelBinding {
    pub entity: String,
    pub value_property: String,
    pub language: Option<String>,
    pub kind: Option<LabelKind>,
    pub text: Option<String>,
}

impl LabelBinding {
    /// Binding that only marks an (entity, value) pair
    pub fn bare(entity: impl Into<String>, value_property: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            value_property: value_property.into(),
            language: None,
            kind: None,
            text: None,
        }
    }

    /// Binding carrying one label
    pub fn label(
        entity: impl Into<String>,
        value_property: impl Into<String>,
        language: impl Into<String>,
        kind: LabelKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            value_property: value_property.into(),
            language: Some(language.into()),
            kind: Some(kind),
            text: Some(text.into()),
        }
    }
}

/// Capitalize a language code for column names (`zh-Hans` -> `Zh-hans`)
pub fn language_suffix(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Name of the main label column for a language
pub fn label_column(language: &str) -> String {
    format!("label{}", language_suffix(language))
}

/// Name of the alternate label column for a language
pub fn alt_column(language: &str) -> String {
    format!("alt{}", language_suffix(language))
}

/// Main and alternate labels of one entity in one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelCell {
    pub language: String,
    pub label: String,
    pub alt: String,
}

impl LabelCell {
    pub fn empty(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.alt.is_empty()
    }
}

/// One output row: an (entity, value) pair with its labels per language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationRow {
    pub entity: String,
    pub value_property: String,
    /// One cell per requested language, in request order
    pub cells: Vec<LabelCell>,
}

impl TranslationRow {
    /// Cell for a language, if it was requested
    pub fn cell(&self, language: &str) -> Option<&LabelCell> {
        self.cells.iter().find(|c| c.language == language)
    }

    /// Main label for a language (empty when not requested)
    pub fn label(&self, language: &str) -> &str {
        self.cell(language).map(|c| c.label.as_str()).unwrap_or("")
    }

    /// Alternate labels for a language (empty when not requested)
    pub fn alt(&self, language: &str) -> &str {
        self.cell(language).map(|c| c.alt.as_str()).unwrap_or("")
    }

    /// True if at least one cell has a label or alt
    pub fn has_translation(&self) -> bool {
        self.cells.iter().any(|c| !c.is_empty())
    }

    /// Fill empty main labels with `fallback`
    pub fn fill_missing_labels(&mut self, fallback: &str) {
        for cell in self.cells.iter_mut().filter(|c| c.label.is_empty()) {
            cell.label = fallback.to_string();
        }
    }

    /// Column values in column order
    pub fn values(&self) -> Vec<&str> {
        let mut values = vec![self.entity.as_str(), self.value_property.as_str()];
        for cell in &self.cells {
            values.push(&cell.label);
            values.push(&cell.alt);
        }
        values
    }

    fn serialize_fields<M: SerializeMap>(&self, map: &mut M) -> std::result::Result<(), M::Error> {
        map.serialize_entry("entity", &self.entity)?;
        map.serialize_entry("value_property", &self.value_property)?;
        for cell in &self.cells {
            map.serialize_entry(&label_column(&cell.language), &cell.label)?;
            map.serialize_entry(&alt_column(&cell.language), &cell.alt)?;
        }
        Ok(())
    }
}

impl Serialize for TranslationRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + 2 * self.cells.len()))?;
        self.serialize_fields(&mut map)?;
        map.end()
    }
}

/// Column names of a translation table
pub fn translation_columns(languages: &[String]) -> Vec<String> {
    let mut columns = vec!["entity".to_string(), "value_property".to_string()];
    for language in languages {
        columns.push(label_column(language));
        columns.push(alt_column(language));
    }
    columns
}

/// Result of a first-order translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTable {
    pub languages: Vec<String>,
    pub rows: Vec<TranslationRow>,
}

impl TranslationTable {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            languages,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> Vec<String> {
        translation_columns(&self.languages)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as (column, value) pairs in column order
    pub fn records(&self) -> Vec<Vec<(String, &str)>> {
        let columns = self.columns();
        self.rows
            .iter()
            .map(|row| columns.iter().cloned().zip(row.values()).collect())
            .collect()
    }

    /// Find the row for an (entity, value) pair
    pub fn find(&self, entity: &str, value_property: &str) -> Option<&TranslationRow> {
        self.rows
            .iter()
            .find(|r| r.entity == entity && r.value_property == value_property)
    }

    /// Rows attached to a value
    pub fn rows_for_value<'a>(
        &'a self,
        value_property: &'a str,
    ) -> impl Iterator<Item = &'a TranslationRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.value_property == value_property)
    }
}

impl Serialize for TranslationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// Link between a main-ontology value and an auxiliary-ontology identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkRecord {
    pub value_property: String,
    pub id_auxiliary: String,
    pub name_auxiliary: String,
}

impl LinkRecord {
    pub fn new(
        value_property: impl Into<String>,
        id_auxiliary: impl Into<String>,
        name_auxiliary: impl Into<String>,
    ) -> Self {
        Self {
            value_property: value_property.into(),
            id_auxiliary: id_auxiliary.into(),
            name_auxiliary: name_auxiliary.into(),
        }
    }
}

/// Ordered collection of cross-ontology links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable {
    records: Vec<LinkRecord>,
}

impl LinkTable {
    pub fn new(records: Vec<LinkRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of `{value_property, id_auxiliary, name_auxiliary}` objects
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a link table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| Error::invalid_input("links", format!("{}: {e}", path.display())))
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct main values, in first-seen order
    pub fn values(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.value_property.as_str()))
    }

    /// Distinct auxiliary ontology names, in first-seen order
    pub fn auxiliary_names(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.name_auxiliary.as_str()))
    }

    /// Records linking to the given auxiliary ontology
    pub fn records_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LinkRecord> + 'a {
        self.records.iter().filter(move |r| r.name_auxiliary == name)
    }

    /// Distinct auxiliary identifiers for an ontology, in first-seen order
    pub fn auxiliary_ids(&self, name: &str) -> Vec<String> {
        distinct(self.records_for(name).map(|r| r.id_auxiliary.as_str()))
    }
}

impl FromIterator<LinkRecord> for LinkTable {
    fn from_iter<I: IntoIterator<Item = LinkRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

/// Provenance of an extended row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceDegree {
    /// Found through the main property
    First,
    /// Found through an auxiliary ontology
    Second,
}

impl SourceDegree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Second => "Second",
        }
    }
}

/// Translation row extended with its second-order provenance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedRow {
    pub row: TranslationRow,
    pub id_auxiliary: Option<String>,
    pub name_auxiliary: Option<String>,
    pub source_degree: SourceDegree,
}

impl ExtendedRow {
    pub fn first(row: TranslationRow) -> Self {
        Self {
            row,
            id_auxiliary: None,
            name_auxiliary: None,
            source_degree: SourceDegree::First,
        }
    }

    pub fn second(row: TranslationRow, link: &LinkRecord) -> Self {
        Self {
            row,
            id_auxiliary: Some(link.id_auxiliary.clone()),
            name_auxiliary: Some(link.name_auxiliary.clone()),
            source_degree: SourceDegree::Second,
        }
    }

    pub fn entity(&self) -> &str {
        &self.row.entity
    }

    pub fn value_property(&self) -> &str {
        &self.row.value_property
    }
}

impl Serialize for ExtendedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5 + 2 * self.row.cells.len()))?;
        self.row.serialize_fields(&mut map)?;
        map.serialize_entry("id_auxiliary", &self.id_auxiliary)?;
        map.serialize_entry("name_auxiliary", &self.name_auxiliary)?;
        map.serialize_entry("source_degree", self.source_degree.as_str())?;
        map.end()
    }
}

/// Auxiliary pass that failed during a second-order translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxiliaryFailure {
    pub property: String,
    pub name: String,
    pub error: String,
}

/// Result of a second-order translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedTable {
    pub languages: Vec<String>,
    pub rows: Vec<ExtendedRow>,
    pub failures: Vec<AuxiliaryFailure>,
}

impl ExtendedTable {
    pub fn columns(&self) -> Vec<String> {
        let mut columns = translation_columns(&self.languages);
        columns.extend(
            ["id_auxiliary", "name_auxiliary", "source_degree"]
                .iter()
                .map(|c| c.to_string()),
        );
        columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with the given provenance
    pub fn rows_with_degree(&self, degree: SourceDegree) -> impl Iterator<Item = &ExtendedRow> {
        self.rows.iter().filter(move |r| r.source_degree == degree)
    }

    /// Rows attached to a main value
    pub fn rows_for_value<'a>(
        &'a self,
        value_property: &'a str,
    ) -> impl Iterator<Item = &'a ExtendedRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.value_property() == value_property)
    }
}

impl Serialize for ExtendedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}
