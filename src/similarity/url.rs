//! URL structure comparison
//!
//! Two reports hitting the same endpoint with different ids or parameter
//! values should still match: numeric path segments are collapsed and
//! parameter values dropped before the Jaccard comparison.

use ahash::AHashSet;
use std::collections::BTreeSet;

use crate::preprocess::url_signature;

/// Jaccard similarity over the combined set of normalized paths and bare
/// query-parameter names from each side's URLs
///
/// Returns 0.0 when either side has no URLs.
pub fn url_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let features_a = url_features(a);
    let features_b = url_features(b);
    if features_a.is_empty() || features_b.is_empty() {
        return 0.0;
    }

    let intersection = features_a.intersection(&features_b).count();
    let union = features_a.union(&features_b).count();
    intersection as f64 / union as f64
}

/// Flatten a URL set into comparable features
///
/// Paths and parameter names are tagged so `/token` the path can never
/// collide with `token` the parameter.
fn url_features(urls: &BTreeSet<String>) -> AHashSet<String> {
    let mut features = AHashSet::new();
    for url in urls {
        let sig = url_signature(url);
        features.insert(format!("path:{}", sig.path));
        for name in sig.param_names {
            features.insert(format!("param:{name}"));
        }
    }
    features
}
