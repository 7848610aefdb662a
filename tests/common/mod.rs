//! Common test utilities
//!
//! [`InMemoryEndpoint`] answers the label queries rendered by the query
//! builder from a list of facts, the way the Wikidata endpoint would.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Mutex;

use wikilabel::endpoint::{EndpointError, SparqlEndpoint};
use wikilabel::models::{LabelBinding, LabelKind};

/// One entity carrying one property value, with its labels
#[derive(Debug, Clone)]
pub struct Fact {
    pub entity: String,
    pub property: String,
    pub value: String,
    pub labels: Vec<(String, LabelKind, String)>,
}

impl Fact {
    pub fn new(entity: &str, property: &str, value: &str) -> Self {
        Self {
            entity: entity.to_string(),
            property: property.to_string(),
            value: value.to_string(),
            labels: Vec::new(),
        }
    }

    pub fn main(mut self, language: &str, text: &str) -> Self {
        self.labels
            .push((language.to_string(), LabelKind::Main, text.to_string()));
        self
    }

    #[allow(dead_code)]
    pub fn alt(mut self, language: &str, text: &str) -> Self {
        self.labels
            .push((language.to_string(), LabelKind::Alt, text.to_string()));
        self
    }
}

/// Fake SPARQL endpoint backed by facts
#[derive(Default)]
pub struct InMemoryEndpoint {
    facts: Vec<Fact>,
    failing: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl InMemoryEndpoint {
    pub fn new(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            ..Default::default()
        }
    }

    /// Every query on `property` fails with a timeout
    #[allow(dead_code)]
    pub fn failing_on(mut self, property: &str) -> Self {
        self.failing.push(property.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn queries_for(&self, property: &str) -> usize {
        let needle = format!("wdt:{property} ");
        self.queries().iter().filter(|q| q.contains(&needle)).count()
    }

    fn answer(&self, query: &str) -> Vec<LabelBinding> {
        let property = Regex::new(r"wdt:(P[0-9]+) ")
            .unwrap()
            .captures(query)
            .map(|c| c[1].to_string())
            .unwrap_or_default();

        let languages: Vec<String> = Regex::new(r"IN \(([^)]*)\)")
            .unwrap()
            .captures(query)
            .map(|c| {
                c[1].split(',')
                    .map(|l| l.trim().trim_matches('"').to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let ids: Option<Vec<String>> = query.find("VALUES").map(|start| {
            let block = &query[start..];
            let block = &block[..block.find('}').unwrap_or(block.len())];
            Regex::new(r#"\("([^"]*)"\)"#)
                .unwrap()
                .captures_iter(block)
                .map(|c| c[1].to_string())
                .collect()
        });

        let mut pairs: BTreeSet<(String, String)> = self
            .facts
            .iter()
            .filter(|f| f.property == property)
            .filter(|f| ids.as_ref().map_or(true, |ids| ids.contains(&f.value)))
            .map(|f| (f.entity.clone(), f.value.clone()))
            .collect();

        if let Some(c) = Regex::new(r"LIMIT ([0-9]+) OFFSET ([0-9]+)")
            .unwrap()
            .captures(query)
        {
            let limit: usize = c[1].parse().unwrap();
            let offset: usize = c[2].parse().unwrap();
            pairs = pairs.into_iter().skip(offset).take(limit).collect();
        }

        let mut bindings = Vec::new();
        for (entity, value) in pairs {
            let labels: Vec<LabelBinding> = self
                .facts
                .iter()
                .filter(|f| f.property == property && f.entity == entity && f.value == value)
                .flat_map(|f| f.labels.iter())
                .filter(|(lang, _, _)| languages.contains(&lang.to_lowercase()))
                .map(|(lang, kind, text)| {
                    LabelBinding::label(entity.as_str(), value.as_str(), lang.to_lowercase(), *kind, text.as_str())
                })
                .collect();

            if labels.is_empty() {
                bindings.push(LabelBinding::bare(entity, value));
            } else {
                bindings.extend(labels);
            }
        }
        bindings
    }
}

#[async_trait]
impl SparqlEndpoint for InMemoryEndpoint {
    async fn execute(&self, query: &str) -> Result<Vec<LabelBinding>, EndpointError> {
        self.queries.lock().unwrap().push(query.to_string());

        if self
            .failing
            .iter()
            .any(|p| query.contains(&format!("wdt:{p} ")))
        {
            return Err(EndpointError::Timeout);
        }

        Ok(self.answer(query))
    }
}

/// Language list from codes
pub fn langs(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

/// Disease Ontology / OMIM facts around copper deficiency
#[allow(dead_code)]
pub fn disease_facts() -> Vec<Fact> {
    vec![
        Fact::new("Q1495005", "P492", "121270").main("fr", "carence en cuivre"),
        Fact::new("Q12136", "P699", "DOID:4").main("fr", "maladie").main("cs", "nemoc"),
        Fact::new("Q12136", "P492", "000001").main("fr", "maladie (OMIM)"),
    ]
}

/// French departments keyed by INSEE code
#[allow(dead_code)]
pub fn department_facts() -> Vec<Fact> {
    vec![
        Fact::new("Q3083", "P2586", "01")
            .main("fr", "Ain")
            .alt("fr", "01")
            .alt("fr", "département de l'Ain"),
        Fact::new("Q3093", "P2586", "02")
            .main("fr", "Aisne")
            .main("pl", "Aisne"),
        Fact::new("Q3113", "P2586", "03")
            .main("fr", "Allier")
            .main("pl", "Allier")
            .alt("pl", "departament Allier"),
        Fact::new("Q3131", "P2586", "04").main("fr", "Alpes-de-Haute-Provence"),
    ]
}
