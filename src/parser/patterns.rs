// file: src/parser/patterns.rs
// description: compiled regex patterns for article detection
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Page text marker that opens an article in the GDPR PDF layout
    pub static ref ARTICLE_MARKER: Regex = Regex::new(
        r"EN\nArticle (\d+)\."
    ).expect("ARTICLE_MARKER regex is valid");

    // Summary key prefix, e.g. "Article 17 - Right to erasure"
    pub static ref ARTICLE_KEY: Regex = Regex::new(
        r"^\s*Article\s+(\d+)\s+-"
    ).expect("ARTICLE_KEY regex is valid");

    // Sentence boundary used by the chunker and the groundedness judge
    pub static ref SENTENCE_END: Regex = Regex::new(
        r"[.!?]+[\s]+"
    ).expect("SENTENCE_END regex is valid");

    // Labelled ("Score: 7") or bare ("7/10") number in an LLM judge reply
    pub static ref JUDGE_SCORE: Regex = Regex::new(
        r"(?i)score\s*[:=]?\s*(\d+(?:\.\d+)?)|(\d+(?:\.\d+)?)"
    ).expect("JUDGE_SCORE regex is valid");
}
