//! Duplicate cluster discovery
//!
//! Connected-component search over the pairwise similarity graph: a
//! breadth-first expansion from each unprocessed report pulls in every
//! neighbor scoring at or above the clustering threshold, directly or
//! transitively.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

use crate::config::{ClusteringConfig, Thresholds};
use crate::detect::DuplicateDetector;
use crate::index::Corpus;
use crate::similarity::SimilarityWeights;

/// A group of mutually reachable reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub reports: BTreeSet<String>,
}

impl DuplicateCluster {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reports.contains(id)
    }
}

/// Cluster discovery over a corpus snapshot
pub struct ClusterFinder<'a> {
    corpus: &'a Corpus,
    thresholds: Thresholds,
    weights: SimilarityWeights,
    config: ClusteringConfig,
}

impl<'a> ClusterFinder<'a> {
    pub fn new(
        corpus: &'a Corpus,
        thresholds: Thresholds,
        weights: SimilarityWeights,
        config: ClusteringConfig,
    ) -> Self {
        Self {
            corpus,
            thresholds,
            weights,
            config,
        }
    }

    /// Discover all duplicate clusters of size >= 2
    ///
    /// Every report (optionally restricted to one program) seeds at most
    /// one expansion; a processed set keeps the whole pass linear in the
    /// number of reports times the per-node detection cost. A detection
    /// failure during expansion marks that node processed with no
    /// outgoing edges, so clustering always completes.
    pub fn find_clusters(
        &self,
        program_filter: Option<&str>,
        threshold: f64,
    ) -> Vec<DuplicateCluster> {
        let detector = DuplicateDetector::new(self.corpus, self.thresholds, self.weights);

        let mut processed: AHashSet<String> = AHashSet::new();
        let mut clusters = Vec::new();

        for seed in self.corpus.ids() {
            if processed.contains(&seed) {
                continue;
            }
            if let Some(program) = program_filter {
                let in_program = self
                    .corpus
                    .get(&seed)
                    .is_some_and(|r| r.program_id == program);
                if !in_program {
                    continue;
                }
            }

            let mut members: BTreeSet<String> = BTreeSet::new();
            let mut queue: VecDeque<String> = VecDeque::new();
            members.insert(seed.clone());
            queue.push_back(seed);

            while let Some(current) = queue.pop_front() {
                if !processed.insert(current.clone()) {
                    continue;
                }

                let result = match detector.detect(
                    &current,
                    program_filter,
                    self.config.expansion_limit,
                ) {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(
                            id = %current,
                            error = %e,
                            "cluster expansion failed; treating node as terminal"
                        );
                        continue;
                    }
                };

                for score in result.matches {
                    // A processed id already belongs to this cluster or an
                    // earlier one; never pull it into a second cluster.
                    if score.overall_score < threshold || processed.contains(&score.report_id) {
                        continue;
                    }
                    if members.insert(score.report_id.clone()) {
                        queue.push_back(score.report_id);
                    }
                }
            }

            if members.len() >= 2 {
                tracing::debug!(size = members.len(), "found duplicate cluster");
                clusters.push(DuplicateCluster { reports: members });
            }
        }

        clusters
    }
}
