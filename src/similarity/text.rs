//! TF-IDF weighted cosine similarity over token lists

use ahash::{AHashMap, AHashSet};

use crate::index::Corpus;

/// Cosine similarity between two token lists under TF-IDF weighting
///
/// Term frequency is occurrence count divided by token-list length; each
/// term's weight is `tf * idf`, with unknown terms taking a neutral IDF
/// of 1.0. Returns 0.0 when either side is empty or has a zero-norm
/// vector, never dividing by zero.
pub fn tfidf_cosine(a: &[String], b: &[String], corpus: &Corpus) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let tf_a = term_frequencies(a);
    let tf_b = term_frequencies(b);

    // Accumulate in sorted term order so the sum is deterministic and
    // exactly symmetric under argument swap.
    let mut terms: Vec<&str> = tf_a
        .keys()
        .chain(tf_b.keys())
        .copied()
        .collect::<AHashSet<&str>>()
        .into_iter()
        .collect();
    terms.sort_unstable();

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for term in terms {
        let idf = corpus.idf(term).unwrap_or(1.0);
        let wa = tf_a.get(term).copied().unwrap_or(0.0) * idf;
        let wb = tf_b.get(term).copied().unwrap_or(0.0) * idf;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn term_frequencies(tokens: &[String]) -> AHashMap<&str, f64> {
    let mut counts: AHashMap<&str, f64> = AHashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    let len = tokens.len() as f64;
    for value in counts.values_mut() {
        *value /= len;
    }
    counts
}
