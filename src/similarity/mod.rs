//! Multi-signal similarity scoring between indexed reports
//!
//! Four independent components (title, description, code, URL) plus a
//! categorical bonus, combined into one weighted overall score. The
//! scorer is deterministic, pure, and symmetric in its two arguments.

mod code;
mod text;
mod url;

pub use code::code_similarity;
pub use text::tfidf_cosine;
pub use url::url_similarity;

use serde::{Deserialize, Serialize};

use crate::index::{Corpus, IndexedReport};

/// Weights combining the component similarities into an overall score
///
/// The four component weights sum to 1.0; the component bonus can push
/// the raw sum above it, so the overall score is clamped at 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub title: f64,
    pub description: f64,
    pub code: f64,
    pub url: f64,
    pub component_bonus: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.3,
            description: 0.3,
            code: 0.25,
            url: 0.15,
            component_bonus: 0.1,
        }
    }
}

/// Outcome of comparing a query report against one candidate
///
/// Component scores and the overall score all lie in [0, 1]. The
/// duplicate flag and confidence are filled in by the detector once the
/// active thresholds are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub report_id: String,
    pub title_similarity: f64,
    pub description_similarity: f64,
    pub code_similarity: f64,
    pub url_similarity: f64,
    pub overall_score: f64,
    pub is_duplicate: bool,
    pub confidence: f64,
}

/// Pairwise report scorer
///
/// Borrows the corpus for IDF lookups; holds no mutable state, so one
/// scorer may be shared across any number of comparisons.
pub struct Scorer<'a> {
    corpus: &'a Corpus,
    weights: SimilarityWeights,
}

impl<'a> Scorer<'a> {
    pub fn new(corpus: &'a Corpus, weights: SimilarityWeights) -> Self {
        Self { corpus, weights }
    }

    /// Score a candidate against the query report
    pub fn score(&self, query: &IndexedReport, candidate: &IndexedReport) -> SimilarityScore {
        let title = tfidf_cosine(&query.title_tokens, &candidate.title_tokens, self.corpus);
        let description = tfidf_cosine(
            &query.description_tokens,
            &candidate.description_tokens,
            self.corpus,
        );
        let code = code_similarity(&query.code_snippets, &candidate.code_snippets);
        let url = url_similarity(&query.urls, &candidate.urls);

        let bonus = if !query.affected_component.is_empty()
            && query.affected_component == candidate.affected_component
        {
            self.weights.component_bonus
        } else {
            0.0
        };

        let overall = (self.weights.title * title
            + self.weights.description * description
            + self.weights.code * code
            + self.weights.url * url
            + bonus)
            .min(1.0);

        SimilarityScore {
            report_id: candidate.id.clone(),
            title_similarity: title,
            description_similarity: description,
            code_similarity: code,
            url_similarity: url,
            overall_score: overall,
            is_duplicate: false,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReportFields;

    fn report(id: &str, title: &str, description: &str) -> IndexedReport {
        let fields = ReportFields {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        };
        IndexedReport::from_fields(id, &fields)
    }

    #[test]
    fn test_identical_reports_score_high() {
        let corpus = Corpus::new();
        let scorer = Scorer::new(&corpus, SimilarityWeights::default());

        let a = report("a", "SQL injection in login", "The username field is injectable");
        let b = report("b", "SQL injection in login", "The username field is injectable");

        let score = scorer.score(&a, &b);
        assert!((score.title_similarity - 1.0).abs() < 1e-9);
        assert!((score.description_similarity - 1.0).abs() < 1e-9);
        // Title and description max out; no code or URLs on either side
        assert!((score.overall_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_reports_score_zero() {
        let corpus = Corpus::new();
        let scorer = Scorer::new(&corpus, SimilarityWeights::default());

        let a = report("a", "SQL injection in login", "username field injectable");
        let b = report("b", "Clickjacking on dashboard", "missing frame headers");

        let score = scorer.score(&a, &b);
        assert_eq!(score.overall_score, 0.0);
    }

    #[test]
    fn test_component_bonus_requires_exact_nonempty_match() {
        let corpus = Corpus::new();
        let scorer = Scorer::new(&corpus, SimilarityWeights::default());

        let mut a = report("a", "SQL injection", "");
        let mut b = report("b", "SQL injection", "");

        // Both empty: no bonus
        let without = scorer.score(&a, &b).overall_score;

        a.affected_component = "auth-service".to_string();
        b.affected_component = "auth-service".to_string();
        let with = scorer.score(&a, &b).overall_score;
        assert!((with - without - 0.1).abs() < 1e-9);

        b.affected_component = "payments".to_string();
        let mismatched = scorer.score(&a, &b).overall_score;
        assert!((mismatched - without).abs() < 1e-9);
    }

    #[test]
    fn test_overall_clamped_to_one() {
        let corpus = Corpus::new();
        let scorer = Scorer::new(&corpus, SimilarityWeights::default());

        let fields = ReportFields {
            title: "SQL injection in login".to_string(),
            description: "Injectable username on https://x.test/login?user=1".to_string(),
            proof_of_concept: "' OR 1=1--".to_string(),
            affected_component: "auth".to_string(),
            ..Default::default()
        };
        let a = IndexedReport::from_fields("a", &fields);
        let b = IndexedReport::from_fields("b", &fields);

        let score = scorer.score(&a, &b);
        // All components at 1.0 plus the bonus would sum to 1.1
        assert_eq!(score.overall_score, 1.0);
    }

    #[test]
    fn test_scoring_is_symmetric() {
        let mut corpus = Corpus::new();
        corpus.add(
            "a",
            &ReportFields {
                title: "SQL injection in login endpoint".to_string(),
                description: "The /login endpoint is vulnerable via the username field"
                    .to_string(),
                ..Default::default()
            },
        );
        corpus.add(
            "b",
            &ReportFields {
                title: "SQLi in login form".to_string(),
                description: "username parameter on /login is injectable".to_string(),
                ..Default::default()
            },
        );

        let scorer = Scorer::new(&corpus, SimilarityWeights::default());
        let a = corpus.get("a").unwrap();
        let b = corpus.get("b").unwrap();

        let ab = scorer.score(a, b);
        let ba = scorer.score(b, a);
        assert_eq!(ab.title_similarity, ba.title_similarity);
        assert_eq!(ab.description_similarity, ba.description_similarity);
        assert_eq!(ab.code_similarity, ba.code_similarity);
        assert_eq!(ab.url_similarity, ba.url_similarity);
        assert_eq!(ab.overall_score, ba.overall_score);
    }
}
