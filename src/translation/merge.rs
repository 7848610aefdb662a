//! Folding raw label bindings into translation rows
//!
//! Bindings are grouped by (entity, value). Inside a group, main labels and
//! alternate labels are collected per language in first-seen order and
//! joined with [`LABEL_DELIMITER`]. The merger keeps its state across
//! [`ResultMerger::extend`] calls, so pages or batches can be folded one
//! after another and a pair split over two pages still ends in one row.

use std::collections::{HashMap, HashSet};

use crate::models::{
    LabelBinding, LabelCell, LabelKind, TranslationRow, TranslationTable, LABEL_DELIMITER,
};

/// Options of the label fold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Drop repeated texts inside a cell, keeping the first occurrence
    pub dedup: bool,
}

#[derive(Debug, Clone)]
struct Group {
    entity: String,
    value_property: String,
    main: Vec<Vec<String>>,
    alt: Vec<Vec<String>>,
}

impl Group {
    fn new(entity: String, value_property: String, languages: usize) -> Self {
        Self {
            entity,
            value_property,
            main: vec![Vec::new(); languages],
            alt: vec![Vec::new(); languages],
        }
    }
}

/// Accumulates bindings into one row per (entity, value)
#[derive(Debug, Clone)]
pub struct ResultMerger {
    languages: Vec<String>,
    language_index: HashMap<String, usize>,
    options: MergeOptions,
    index: HashMap<(String, String), usize>,
    groups: Vec<Group>,
}

impl ResultMerger {
    pub fn new(languages: Vec<String>) -> Self {
        Self::with_options(languages, MergeOptions::default())
    }

    pub fn with_options(languages: Vec<String>, options: MergeOptions) -> Self {
        let mut language_index = HashMap::new();
        for (idx, language) in languages.iter().enumerate() {
            language_index.entry(language.to_lowercase()).or_insert(idx);
        }

        Self {
            languages,
            language_index,
            options,
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Number of distinct (entity, value) pairs seen so far
    pub fn pairs(&self) -> usize {
        self.groups.len()
    }

    /// Fold one binding
    ///
    /// Labels in languages that were not requested are ignored, but the pair
    /// itself is still recorded.
    pub fn push(&mut self, binding: LabelBinding) {
        let LabelBinding {
            entity,
            value_property,
            language,
            kind,
            text,
        } = binding;

        let key = (entity, value_property);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.groups
                    .push(Group::new(key.0.clone(), key.1.clone(), self.languages.len()));
                self.index.insert(key, idx);
                idx
            }
        };

        let (Some(language), Some(kind), Some(text)) = (language, kind, text) else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let Some(&lang_idx) = self.language_index.get(&language.to_lowercase()) else {
            return;
        };

        let group = &mut self.groups[idx];
        let texts = match kind {
            LabelKind::Main => &mut group.main[lang_idx],
            LabelKind::Alt => &mut group.alt[lang_idx],
        };
        if self.options.dedup && texts.contains(&text) {
            return;
        }
        texts.push(text);
    }

    /// Fold a page or batch of bindings
    pub fn extend<I: IntoIterator<Item = LabelBinding>>(&mut self, bindings: I) {
        for binding in bindings {
            self.push(binding);
        }
    }

    /// Build the table, dropping pairs without any label
    pub fn finish(self) -> TranslationTable {
        let languages = self.languages;
        let rows = self
            .groups
            .into_iter()
            .map(|group| TranslationRow {
                entity: group.entity,
                value_property: group.value_property,
                cells: languages
                    .iter()
                    .zip(group.main.iter().zip(group.alt.iter()))
                    .map(|(language, (main, alt))| LabelCell {
                        language: language.clone(),
                        label: main.join(LABEL_DELIMITER),
                        alt: alt.join(LABEL_DELIMITER),
                    })
                    .collect(),
            })
            .filter(TranslationRow::has_translation)
            .collect();

        TranslationTable { languages, rows }
    }
}

/// One-shot fold of a binding list
pub fn merge_bindings(
    languages: &[String],
    options: MergeOptions,
    bindings: impl IntoIterator<Item = LabelBinding>,
) -> TranslationTable {
    let mut merger = ResultMerger::with_options(languages.to_vec(), options);
    merger.extend(bindings);
    merger.finish()
}

/// Number of distinct (entity, value) pairs in a list of bindings
pub fn distinct_pairs(bindings: &[LabelBinding]) -> usize {
    bindings
        .iter()
        .map(|b| (b.entity.as_str(), b.value_property.as_str()))
        .collect::<HashSet<_>>()
        .len()
}
