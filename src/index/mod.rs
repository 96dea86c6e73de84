//! In-memory report corpus with incremental document-frequency tracking
//!
//! The corpus owns the processed form of every indexed report and the
//! term statistics the scorer needs. Document frequencies are maintained
//! incrementally on every insert (and on overwrite, the replaced entry's
//! contribution is retired first), so no write ever rescans the corpus;
//! IDF values are derived lazily at query time from the live counts.

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::preprocess;

/// Raw fields of a submitted report, as received from the system of record
///
/// Every field defaults to empty; absent text degrades to empty token
/// sequences rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub proof_of_concept: String,
    #[serde(default)]
    pub reproduction_steps: String,
    #[serde(default)]
    pub vulnerability_type: String,
    #[serde(default)]
    pub affected_component: String,
    #[serde(default)]
    pub program_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Processed form of a report, owned exclusively by the corpus
///
/// Immutable after creation; updating a report means re-adding it under
/// the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedReport {
    pub id: String,
    pub title_tokens: Vec<String>,
    pub description_tokens: Vec<String>,
    pub code_snippets: BTreeSet<String>,
    pub urls: BTreeSet<String>,
    pub vulnerability_type: String,
    pub affected_component: String,
    pub program_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl IndexedReport {
    /// Build an indexed report by preprocessing raw fields
    pub fn from_fields(id: impl Into<String>, fields: &ReportFields) -> Self {
        let title_tokens = preprocess::tokenize(&fields.title);

        // Reproduction steps are free text like the description, so their
        // terms participate in text scoring.
        let mut description_tokens = preprocess::tokenize(&fields.description);
        description_tokens.extend(preprocess::tokenize(&fields.reproduction_steps));

        let mut code_snippets = preprocess::extract_code(&fields.description);
        code_snippets.extend(preprocess::extract_code(&fields.reproduction_steps));
        if fields.proof_of_concept.contains('`') {
            code_snippets.extend(preprocess::extract_code(&fields.proof_of_concept));
        } else {
            // A bare proof-of-concept field is code by definition, even
            // without markdown fences.
            let poc = fields.proof_of_concept.trim();
            if !poc.is_empty() {
                code_snippets.insert(poc.to_string());
            }
        }

        let mut urls = preprocess::extract_urls(&fields.description);
        urls.extend(preprocess::extract_urls(&fields.proof_of_concept));
        urls.extend(preprocess::extract_urls(&fields.reproduction_steps));

        Self {
            id: id.into(),
            title_tokens,
            description_tokens,
            code_snippets,
            urls,
            vulnerability_type: fields.vulnerability_type.clone(),
            affected_component: fields.affected_component.clone(),
            program_id: fields.program_id.clone(),
            created_at: fields.created_at,
        }
    }

    /// Unique terms across title and description token lists
    fn unique_terms(&self) -> AHashSet<&str> {
        self.title_tokens
            .iter()
            .chain(self.description_tokens.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Mapping of report id to indexed report, plus live term statistics
#[derive(Debug, Default)]
pub struct Corpus {
    reports: AHashMap<String, IndexedReport>,
    doc_freq: AHashMap<String, usize>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a report, overwriting any prior entry with the same id
    ///
    /// Overwriting retires the replaced entry's document-frequency
    /// contribution before the new one is counted, so the statistics stay
    /// exact without a corpus rescan.
    pub fn add(&mut self, id: impl Into<String>, fields: &ReportFields) {
        let report = IndexedReport::from_fields(id, fields);

        if let Some(old) = self.reports.get(&report.id) {
            let retired: Vec<String> =
                old.unique_terms().into_iter().map(str::to_string).collect();
            for term in retired {
                if let Some(count) = self.doc_freq.get_mut(&term) {
                    *count -= 1;
                    if *count == 0 {
                        self.doc_freq.remove(&term);
                    }
                }
            }
        }

        for term in report.unique_terms() {
            *self.doc_freq.entry(term.to_string()).or_insert(0) += 1;
        }

        tracing::debug!(
            id = %report.id,
            terms = report.title_tokens.len() + report.description_tokens.len(),
            corpus_size = self.reports.len() + 1,
            "indexed report"
        );

        self.reports.insert(report.id.clone(), report);
    }

    /// Look up a report; absence is a normal outcome
    pub fn get(&self, id: &str) -> Option<&IndexedReport> {
        self.reports.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reports.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Number of distinct terms across all indexed title/description text
    pub fn unique_terms(&self) -> usize {
        self.doc_freq.len()
    }

    /// Inverse document frequency: `ln(N / df) + 1`
    ///
    /// `None` for terms the corpus has never seen (scorers substitute a
    /// neutral weight of 1.0) and for an empty corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        if self.reports.is_empty() {
            return None;
        }
        let df = *self.doc_freq.get(term)?;
        let n = self.reports.len() as f64;
        Some((n / df as f64).ln() + 1.0)
    }

    /// All indexed report ids in deterministic (sorted) order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.reports.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedReport> {
        self.reports.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str, description: &str) -> ReportFields {
        ReportFields {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut corpus = Corpus::new();
        corpus.add("r1", &fields("SQL injection", "The login endpoint is injectable"));

        let report = corpus.get("r1").expect("report should be indexed");
        assert_eq!(report.title_tokens, vec!["sql", "injection"]);
        assert!(report.description_tokens.contains(&"login".to_string()));
        assert!(corpus.get("missing").is_none());
    }

    #[test]
    fn test_idf_rarer_terms_weigh_more() {
        let mut corpus = Corpus::new();
        corpus.add("r1", &fields("SQL injection login", ""));
        corpus.add("r2", &fields("XSS login", ""));
        corpus.add("r3", &fields("CSRF login", ""));

        // "login" appears in all three, "injection" in one
        let common = corpus.idf("login").unwrap();
        let rare = corpus.idf("injection").unwrap();
        assert!(rare > common);
        assert!((common - 1.0).abs() < 1e-9); // ln(3/3) + 1
    }

    #[test]
    fn test_idf_unknown_term() {
        let mut corpus = Corpus::new();
        corpus.add("r1", &fields("SQL injection", ""));
        assert!(corpus.idf("nonexistent").is_none());
    }

    #[test]
    fn test_idf_empty_corpus() {
        let corpus = Corpus::new();
        assert!(corpus.idf("anything").is_none());
    }

    #[test]
    fn test_overwrite_retires_old_terms() {
        let mut corpus = Corpus::new();
        corpus.add("r1", &fields("SQL injection", ""));
        assert!(corpus.idf("injection").is_some());

        corpus.add("r1", &fields("Open redirect", ""));
        assert_eq!(corpus.len(), 1);
        assert!(corpus.idf("injection").is_none());
        assert!(corpus.idf("redirect").is_some());
    }

    #[test]
    fn test_poc_without_fences_is_one_snippet() {
        let mut corpus = Corpus::new();
        let f = ReportFields {
            title: "SQLi".to_string(),
            proof_of_concept: "' OR 1=1--".to_string(),
            ..Default::default()
        };
        corpus.add("r1", &f);

        let report = corpus.get("r1").unwrap();
        assert_eq!(report.code_snippets.len(), 1);
        assert!(report.code_snippets.contains("' OR 1=1--"));
    }

    #[test]
    fn test_ids_sorted() {
        let mut corpus = Corpus::new();
        corpus.add("b", &fields("two", ""));
        corpus.add("a", &fields("one", ""));
        corpus.add("c", &fields("three", ""));
        assert_eq!(corpus.ids(), vec!["a", "b", "c"]);
    }
}
