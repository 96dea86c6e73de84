//! Duplicate detection: rank indexed reports against a query report
//!
//! The detector reads the corpus, delegates pairwise comparison to the
//! scorer, ranks candidates, and classifies duplicates against the active
//! thresholds.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::Thresholds;
use crate::error::{Result, RetriageError};
use crate::index::Corpus;
use crate::similarity::{Scorer, SimilarityScore, SimilarityWeights};

/// Outcome of one detection query
///
/// Matches are sorted descending by overall score and truncated to the
/// caller's limit; `highest_match` is the first entry, when any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateDetectionResult {
    pub query_id: String,
    pub matches: Vec<SimilarityScore>,
    pub highest_match: Option<SimilarityScore>,
    pub detection_time_ms: u64,
}

/// Read-only detection pass over a corpus snapshot
pub struct DuplicateDetector<'a> {
    corpus: &'a Corpus,
    thresholds: Thresholds,
    weights: SimilarityWeights,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(corpus: &'a Corpus, thresholds: Thresholds, weights: SimilarityWeights) -> Self {
        Self {
            corpus,
            thresholds,
            weights,
        }
    }

    /// Rank every eligible candidate against the query report
    ///
    /// Fails with `ReportNotFound` when the query id was never indexed;
    /// that is a caller error, distinct from "no duplicates found".
    /// Candidates are excluded when a program filter is given and their
    /// `program_id` differs, or when both sides carry a non-empty
    /// `vulnerability_type` that does not match (cross-type reports are
    /// never duplicates of each other).
    pub fn detect(
        &self,
        query_id: &str,
        program_filter: Option<&str>,
        limit: usize,
    ) -> Result<DuplicateDetectionResult> {
        let start = Instant::now();

        let query = self
            .corpus
            .get(query_id)
            .ok_or_else(|| RetriageError::ReportNotFound {
                id: query_id.to_string(),
            })?;

        let scorer = Scorer::new(self.corpus, self.weights);

        let mut matches: Vec<SimilarityScore> = self
            .corpus
            .iter()
            .filter(|candidate| candidate.id != query.id)
            .filter(|candidate| match program_filter {
                Some(program) => candidate.program_id == program,
                None => true,
            })
            .filter(|candidate| {
                query.vulnerability_type.is_empty()
                    || candidate.vulnerability_type.is_empty()
                    || query.vulnerability_type == candidate.vulnerability_type
            })
            .map(|candidate| scorer.score(query, candidate))
            .collect();

        // Descending by score; ties broken by id so repeated queries over
        // an unchanged corpus return identical output.
        matches.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.report_id.cmp(&b.report_id))
        });
        matches.truncate(limit);

        for score in &mut matches {
            score.is_duplicate = score.overall_score >= self.thresholds.overall;
            score.confidence = (score.overall_score / self.thresholds.overall).min(1.0);
        }

        let highest_match = matches.first().cloned();

        tracing::debug!(
            query_id,
            candidates = matches.len(),
            best = highest_match.as_ref().map(|m| m.overall_score),
            "detection complete"
        );

        Ok(DuplicateDetectionResult {
            query_id: query_id.to_string(),
            matches,
            highest_match,
            detection_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Run `detect` for each id, isolating per-id failures
    ///
    /// A failing id (typically one that was never indexed) is logged and
    /// omitted from the output; the batch itself never aborts.
    pub fn batch_detect(
        &self,
        ids: &[String],
        program_filter: Option<&str>,
        limit: usize,
    ) -> Vec<DuplicateDetectionResult> {
        ids.iter()
            .filter_map(|id| match self.detect(id, program_filter, limit) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping report in batch detection");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReportFields;

    fn fields(title: &str, description: &str, program: &str, vuln_type: &str) -> ReportFields {
        ReportFields {
            title: title.to_string(),
            description: description.to_string(),
            program_id: program.to_string(),
            vulnerability_type: vuln_type.to_string(),
            ..Default::default()
        }
    }

    fn seeded_corpus() -> Corpus {
        let mut corpus = Corpus::new();
        corpus.add(
            "r1",
            &fields(
                "SQL injection in login endpoint",
                "The /login endpoint is vulnerable to SQL injection via the username field",
                "prog-1",
                "sqli",
            ),
        );
        corpus.add(
            "r2",
            &fields(
                "SQLi in login form",
                "username parameter on /login is injectable",
                "prog-1",
                "sqli",
            ),
        );
        corpus.add(
            "r3",
            &fields(
                "Clickjacking on settings page",
                "settings page can be framed",
                "prog-2",
                "clickjacking",
            ),
        );
        corpus
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let err = detector.detect("ghost", None, 10).unwrap_err();
        assert!(matches!(err, RetriageError::ReportNotFound { id } if id == "ghost"));
    }

    #[test]
    fn test_detects_near_duplicate() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r2", None, 10).unwrap();
        let best = result.highest_match.expect("should find a match");
        assert_eq!(best.report_id, "r1");
        assert!(best.overall_score > 0.1);
        assert_eq!(result.matches[0].report_id, best.report_id);
    }

    #[test]
    fn test_results_sorted_descending() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r1", None, 10).unwrap();
        for pair in result.matches.windows(2) {
            assert!(pair[0].overall_score >= pair[1].overall_score);
        }
    }

    #[test]
    fn test_limit_respected() {
        let mut corpus = Corpus::new();
        for i in 0..20 {
            corpus.add(
                format!("r{i}"),
                &fields("SQL injection login", "username injectable", "prog-1", ""),
            );
        }
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r0", None, 5).unwrap();
        assert_eq!(result.matches.len(), 5);
    }

    #[test]
    fn test_program_filter_excludes_other_programs() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r1", Some("prog-1"), 10).unwrap();
        assert!(result.matches.iter().all(|m| m.report_id != "r3"));
    }

    #[test]
    fn test_cross_type_candidates_excluded() {
        let mut corpus = seeded_corpus();
        // Same text as r1 but a different declared type
        corpus.add(
            "r4",
            &fields(
                "SQL injection in login endpoint",
                "The /login endpoint is vulnerable to SQL injection via the username field",
                "prog-1",
                "xss",
            ),
        );
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r1", None, 10).unwrap();
        assert!(result.matches.iter().all(|m| m.report_id != "r4"));
    }

    #[test]
    fn test_untyped_candidates_still_considered() {
        let mut corpus = seeded_corpus();
        corpus.add(
            "r5",
            &fields("SQL injection in login endpoint", "", "prog-1", ""),
        );
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("r1", None, 10).unwrap();
        assert!(result.matches.iter().any(|m| m.report_id == "r5"));
    }

    #[test]
    fn test_confidence_capped_at_one() {
        let mut corpus = Corpus::new();
        let same = ReportFields {
            title: "SQL injection login endpoint".to_string(),
            description: "username injectable".to_string(),
            proof_of_concept: "' OR 1=1--".to_string(),
            affected_component: "auth".to_string(),
            program_id: "p".to_string(),
            ..Default::default()
        };
        corpus.add("a", &same);
        corpus.add("b", &same);
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let result = detector.detect("a", None, 10).unwrap();
        let best = result.highest_match.unwrap();
        assert!(best.is_duplicate);
        assert_eq!(best.confidence, 1.0);
    }

    #[test]
    fn test_batch_skips_unknown_ids() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let ids = vec!["r1".to_string(), "ghost".to_string(), "r2".to_string()];
        let results = detector.batch_detect(&ids, None, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].query_id, "r1");
        assert_eq!(results[1].query_id, "r2");
    }

    #[test]
    fn test_detection_is_idempotent() {
        let corpus = seeded_corpus();
        let detector =
            DuplicateDetector::new(&corpus, Thresholds::default(), SimilarityWeights::default());

        let first = detector.detect("r2", None, 10).unwrap();
        let second = detector.detect("r2", None, 10).unwrap();
        let ids_first: Vec<&str> = first.matches.iter().map(|m| m.report_id.as_str()).collect();
        let ids_second: Vec<&str> =
            second.matches.iter().map(|m| m.report_id.as_str()).collect();
        assert_eq!(ids_first, ids_second);
        for (a, b) in first.matches.iter().zip(second.matches.iter()) {
            assert_eq!(a.overall_score, b.overall_score);
        }
    }
}
