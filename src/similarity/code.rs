//! Structural code comparison via character n-gram Jaccard similarity
//!
//! Snippets are normalized (comments and whitespace stripped) before
//! comparison, so cosmetic edits like reformatting or added commentary do
//! not defeat the match.

use ahash::AHashSet;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const NGRAM_LEN: usize = 3;

fn block_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
}

fn line_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//[^\n]*").unwrap())
}

/// N-gram Jaccard similarity between two sides' code snippets
///
/// Each side's snippets are concatenated, normalized, and decomposed into
/// 3-character n-grams; the result is `|A ∩ B| / |A ∪ B|`. Returns 0.0
/// when either side is empty or too short to produce an n-gram.
pub fn code_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let norm_a = normalize_code(a);
    let norm_b = normalize_code(b);

    let grams_a = ngrams(&norm_a);
    let grams_b = ngrams(&norm_b);
    if grams_a.is_empty() || grams_b.is_empty() {
        return 0.0;
    }

    let intersection = grams_a.intersection(&grams_b).count();
    let union = grams_a.union(&grams_b).count();
    intersection as f64 / union as f64
}

/// Concatenate snippets and strip comments and whitespace
fn normalize_code(snippets: &BTreeSet<String>) -> String {
    let joined = snippets.iter().cloned().collect::<Vec<_>>().join("\n");
    let stripped = block_comment_re().replace_all(&joined, "");
    let stripped = line_comment_re().replace_all(&stripped, "");
    stripped.chars().filter(|c| !c.is_whitespace()).collect()
}

fn ngrams(s: &str) -> AHashSet<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < NGRAM_LEN {
        return AHashSet::new();
    }
    chars
        .windows(NGRAM_LEN)
        .map(|w| w.iter().collect())
        .collect()
}
