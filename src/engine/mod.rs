//! Engine facade: the operations a host system calls
//!
//! An explicitly constructed service object owning the corpus and the
//! mutable threshold set. There is deliberately no process-wide instance;
//! hosts hold the engine wherever they keep their other shared state.
//!
//! Locking discipline: `add_report` and `set_thresholds` take the write
//! side of their lock, every read operation the read side. Readers may
//! run concurrently with each other but never observe a half-applied
//! mutation, because the report map and the document-frequency table
//! live behind the same lock.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::cluster::{ClusterFinder, DuplicateCluster};
use crate::config::{Config, Thresholds, ThresholdUpdate};
use crate::detect::{DuplicateDetector, DuplicateDetectionResult};
use crate::error::Result;
use crate::index::{Corpus, ReportFields};

/// Default result cap for a single detection query
pub const DEFAULT_DETECT_LIMIT: usize = 10;

/// Corpus and threshold statistics for observability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub reports_indexed: usize,
    pub unique_terms: usize,
    pub thresholds: Thresholds,
}

/// The duplicate-detection engine
///
/// The corpus lives for the lifetime of this value; hosts rebuild it from
/// their system of record on restart by replaying `add_report`.
pub struct Engine {
    corpus: RwLock<Corpus>,
    thresholds: RwLock<Thresholds>,
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            corpus: RwLock::new(Corpus::new()),
            thresholds: RwLock::new(config.thresholds),
            config,
        }
    }

    /// Index a report, overwriting any prior entry with the same id
    pub fn add_report(&self, id: impl Into<String>, fields: &ReportFields) {
        let mut corpus = self.corpus.write().unwrap();
        corpus.add(id, fields);
    }

    /// Rank indexed reports against the given query report
    pub fn detect_duplicates(
        &self,
        query_id: &str,
        program_filter: Option<&str>,
        limit: usize,
    ) -> Result<DuplicateDetectionResult> {
        let corpus = self.corpus.read().unwrap();
        let thresholds = *self.thresholds.read().unwrap();
        let detector = DuplicateDetector::new(&corpus, thresholds, self.config.weights);
        detector.detect(query_id, program_filter, limit)
    }

    /// Run detection for each id, omitting ids that fail
    pub fn batch_detect(
        &self,
        ids: &[String],
        program_filter: Option<&str>,
    ) -> Vec<DuplicateDetectionResult> {
        let corpus = self.corpus.read().unwrap();
        let thresholds = *self.thresholds.read().unwrap();
        let detector = DuplicateDetector::new(&corpus, thresholds, self.config.weights);
        detector.batch_detect(ids, program_filter, DEFAULT_DETECT_LIMIT)
    }

    /// Discover duplicate clusters across the corpus
    ///
    /// `threshold` defaults to the configured clustering threshold when
    /// not supplied.
    pub fn find_duplicate_clusters(
        &self,
        program_filter: Option<&str>,
        threshold: Option<f64>,
    ) -> Vec<DuplicateCluster> {
        let corpus = self.corpus.read().unwrap();
        let thresholds = *self.thresholds.read().unwrap();
        let finder = ClusterFinder::new(
            &corpus,
            thresholds,
            self.config.weights,
            self.config.clustering,
        );
        finder.find_clusters(
            program_filter,
            threshold.unwrap_or(self.config.clustering.threshold),
        )
    }

    /// Apply a partial threshold update
    ///
    /// Takes effect on the next detection call; results already returned
    /// are never reclassified.
    pub fn set_thresholds(&self, update: ThresholdUpdate) {
        let mut thresholds = self.thresholds.write().unwrap();
        update.apply(&mut thresholds);
        tracing::debug!(?thresholds, "thresholds updated");
    }

    pub fn thresholds(&self) -> Thresholds {
        *self.thresholds.read().unwrap()
    }

    /// Corpus and threshold statistics
    pub fn get_statistics(&self) -> EngineStats {
        let corpus = self.corpus.read().unwrap();
        EngineStats {
            reports_indexed: corpus.len(),
            unique_terms: corpus.unique_terms(),
            thresholds: *self.thresholds.read().unwrap(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqli_fields() -> ReportFields {
        ReportFields {
            title: "SQL injection in login endpoint".to_string(),
            description: "The /login endpoint is injectable via the username field".to_string(),
            proof_of_concept: "' OR 1=1--".to_string(),
            affected_component: "auth".to_string(),
            program_id: "prog-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_stats() {
        let engine = Engine::default();
        assert_eq!(engine.get_statistics().reports_indexed, 0);

        engine.add_report("r1", &sqli_fields());
        let stats = engine.get_statistics();
        assert_eq!(stats.reports_indexed, 1);
        assert!(stats.unique_terms > 0);
        assert_eq!(stats.thresholds.overall, 0.65);
    }

    #[test]
    fn test_resubmission_is_flagged() {
        let engine = Engine::default();
        engine.add_report("r1", &sqli_fields());
        engine.add_report("r2", &sqli_fields());

        let result = engine.detect_duplicates("r2", None, 10).unwrap();
        let best = result.highest_match.unwrap();
        assert_eq!(best.report_id, "r1");
        assert!(best.is_duplicate);
    }

    #[test]
    fn test_threshold_update_reclassifies_next_call() {
        let engine = Engine::default();
        engine.add_report("r1", &sqli_fields());
        let mut near = sqli_fields();
        near.proof_of_concept.clear();
        near.affected_component.clear();
        engine.add_report("r2", &near);

        // Text-only match scores 0.6: below 0.65 with defaults
        let result = engine.detect_duplicates("r2", None, 10).unwrap();
        assert!(!result.highest_match.unwrap().is_duplicate);

        engine.set_thresholds(ThresholdUpdate {
            overall: Some(0.5),
            ..Default::default()
        });
        let result = engine.detect_duplicates("r2", None, 10).unwrap();
        assert!(result.highest_match.unwrap().is_duplicate);
    }
}
