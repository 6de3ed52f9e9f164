// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Keyword extraction and similarity.
//!
//! Free text becomes a canonical, stemmed, stopword-free keyword sequence:
//!
//! ```text
//! "The best laptops for students!"
//!       │ lowercase + strip punctuation
//!       ▼
//! "the best laptops for students"
//!       │ split, drop short tokens + stopwords
//!       ▼
//! ["best", "laptops", "students"]
//!       │ Porter stem + ordered dedup
//!       ▼
//! ["best", "laptop", "student"]
//! ```
//!
//! The pipeline is pure and synchronous. Extraction is stable: feeding the
//! space-joined output back through [`extract_keywords`] yields the same
//! sequence, which is what makes the canonical cache keys reproducible.

pub mod stopwords;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use stopwords::is_stopword;

/// Tokens shorter than this never become keywords.
const MIN_TOKEN_LEN: usize = 3;

/// Characters that survive tokenization: word characters plus the accented
/// vowels and ç the Portuguese side of the query corpus uses.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || matches!(
            c,
            'á' | 'à' | 'â' | 'ã' | 'ä'
                | 'é' | 'è' | 'ê' | 'ë'
                | 'í' | 'ì' | 'î' | 'ï'
                | 'ó' | 'ò' | 'ô' | 'õ' | 'ö'
                | 'ú' | 'ù' | 'û' | 'ü'
                | 'ç'
        )
}

/// Extract the canonical keyword sequence from free text.
///
/// Lowercases, strips everything outside the token alphabet, drops tokens
/// shorter than three characters or present in the combined EN+PT stopword
/// table, stems the survivors, and deduplicates preserving first-seen order.
/// Empty input yields an empty vec; this never fails.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let stemmer = Stemmer::create(Algorithm::English);
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_token_char(c) { c } else { ' ' })
        .collect();

    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() < MIN_TOKEN_LEN || is_stopword(token) {
            continue;
        }
        let stem = stemmer.stem(token).into_owned();
        if seen.insert(stem.clone()) {
            keywords.push(stem);
        }
    }
    keywords
}

/// Fold a single word to its diacritic-insensitive index form.
///
/// Lowercase, trim, NFD-decompose, strip combining marks — so "José" and
/// "jose" land on the same index key.
#[must_use]
pub fn normalize_keyword(word: &str) -> String {
    word.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Jaccard similarity between two keyword sets: |A∩B| / |A∪B|.
///
/// Two empty sets are defined as identical (1.0); exactly one empty set
/// scores 0.0. Symmetric in its arguments.
#[must_use]
pub fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: std::collections::HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: std::collections::HashSet<&str> = b.iter().map(String::as_str).collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}
