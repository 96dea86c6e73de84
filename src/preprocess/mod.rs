//! Text preprocessing for report comparison
//!
//! Turns raw report fields into comparable forms: normalized term lists,
//! extracted code snippets, and normalized URLs. All functions here are
//! pure and side-effect free.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

mod stopwords;

pub use stopwords::is_stop_word;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9]+").unwrap())
}

fn fenced_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:[a-zA-Z0-9_+-]*\n)?(.*?)```").unwrap())
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`\n]+)`").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"'\)\]]+"#).unwrap())
}

/// Tokenize free text into normalized terms
///
/// Lower-cases, extracts alphanumeric runs longer than 2 characters, and
/// drops common English stop words. Empty input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    word_re()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 2 && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Extract code snippets from markdown-style text
///
/// Pulls fenced blocks (triple backticks) and inline code (single
/// backticks), strips the delimiters, and discards empty results.
pub fn extract_code(text: &str) -> BTreeSet<String> {
    let mut snippets = BTreeSet::new();
    if text.is_empty() {
        return snippets;
    }

    // Fenced blocks first; they are removed before inline scanning so a
    // fence's backticks are not re-matched as inline spans.
    for cap in fenced_code_re().captures_iter(text) {
        let snippet = cap[1].trim();
        if !snippet.is_empty() {
            snippets.insert(snippet.to_string());
        }
    }

    let without_fences = fenced_code_re().replace_all(text, " ");
    for cap in inline_code_re().captures_iter(&without_fences) {
        let snippet = cap[1].trim();
        if !snippet.is_empty() {
            snippets.insert(snippet.to_string());
        }
    }

    snippets
}

/// Extract normalized URLs from free text
///
/// Matches `http(s)://` tokens, strips trailing punctuation and
/// `#fragment` suffixes, and lower-cases for comparison.
pub fn extract_urls(text: &str) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    if text.is_empty() {
        return urls;
    }

    for m in url_re().find_iter(text) {
        let mut url = m.as_str();

        if let Some(pos) = url.find('#') {
            url = &url[..pos];
        }
        let url = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        if url.is_empty() {
            continue;
        }

        urls.insert(url.to_lowercase());
    }

    urls
}

/// Structural signature of a URL: its path with numeric segments collapsed
/// to a placeholder, plus the bare names of its query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSignature {
    pub path: String,
    pub param_names: Vec<String>,
}

/// Reduce a URL to its comparable structure
///
/// `/users/42/profile?id=7&x=1` and `/users/99/profile?id=3&x=2` produce
/// identical signatures: numeric path segments become `{n}` and parameter
/// values are dropped entirely.
pub fn url_signature(url: &str) -> UrlSignature {
    // Strip scheme and authority; the path starts at the first '/' after
    // the "://" separator.
    let after_scheme = url
        .find("://")
        .map(|pos| &url[pos + 3..])
        .unwrap_or(url);
    let (path_and_query, _) = split_once_or_whole(after_scheme, '#');
    let rest = match path_and_query.find('/') {
        Some(pos) => &path_and_query[pos..],
        None => "/",
    };

    let (raw_path, query) = split_once_or_whole(rest, '?');

    let path = raw_path
        .split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()) {
                "{n}"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut param_names: Vec<String> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| split_once_or_whole(p, '=').0.to_string())
        .filter(|name| !name.is_empty())
        .collect();
    param_names.sort();
    param_names.dedup();

    UrlSignature { path, param_names }
}

fn split_once_or_whole(s: &str, sep: char) -> (&str, &str) {
    match s.split_once(sep) {
        Some((a, b)) => (a, b),
        None => (s, ""),
    }
}
