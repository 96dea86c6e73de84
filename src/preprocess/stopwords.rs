//! Closed stop-word list for tokenization
//!
//! Common English function words that carry no signal for report
//! similarity. Words of length <= 2 are dropped by the tokenizer before
//! this list is consulted, so none appear here.

/// Check whether a lower-cased word is a stop word
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "about"
            | "above"
            | "after"
            | "again"
            | "all"
            | "and"
            | "any"
            | "are"
            | "because"
            | "been"
            | "before"
            | "being"
            | "below"
            | "between"
            | "both"
            | "but"
            | "can"
            | "could"
            | "did"
            | "does"
            | "doing"
            | "down"
            | "during"
            | "each"
            | "few"
            | "for"
            | "from"
            | "further"
            | "had"
            | "has"
            | "have"
            | "having"
            | "her"
            | "here"
            | "him"
            | "his"
            | "how"
            | "into"
            | "its"
            | "just"
            | "more"
            | "most"
            | "not"
            | "now"
            | "once"
            | "only"
            | "other"
            | "our"
            | "out"
            | "over"
            | "own"
            | "same"
            | "she"
            | "should"
            | "some"
            | "such"
            | "than"
            | "that"
            | "the"
            | "their"
            | "them"
            | "then"
            | "there"
            | "these"
            | "they"
            | "this"
            | "those"
            | "through"
            | "under"
            | "until"
            | "very"
            | "was"
            | "were"
            | "what"
            | "when"
            | "where"
            | "which"
            | "while"
            | "who"
            | "why"
            | "will"
            | "with"
            | "would"
            | "you"
            | "your"
    )
}
