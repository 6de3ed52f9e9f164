//! Property-based tests for the keyword pipeline.
//!
//! The canonical-key and similarity layers carry the invariants the whole
//! lookup chain leans on, so they get fuzzed rather than example-tested:
//! order invariance, extraction stability, similarity bounds and symmetry.

use proptest::prelude::*;

use semantic_cache::keyspace;
use semantic_cache::{extract_keywords, jaccard_similarity, normalize_keyword};

/// Realistic search vocabulary; keeps generated queries shaped like the
/// traffic the cache actually sees.
const VOCAB: &[&str] = &[
    "laptop", "laptops", "charger", "chargers", "usb", "cable", "wireless",
    "mouse", "keyboard", "monitor", "gaming", "notebook", "battery", "screen",
    "adapter", "headphone", "headphones", "speaker", "webcam", "printer",
    "backpack", "sleeve", "student", "students", "cheap", "best", "premium",
];

fn query_words() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(VOCAB), 1..8)
}

fn canonical_for(words: &[&str], page: u32, size: u32) -> String {
    let mut keywords = extract_keywords(&words.join(" "));
    keywords.sort();
    keyspace::canonical_key(&keywords, page, size)
}

proptest! {
    /// Any permutation of the same word set produces the same canonical key.
    #[test]
    fn canonical_key_is_order_invariant(words in query_words(), page in 1u32..50, size in 1u32..100) {
        let mut reversed = words.clone();
        reversed.reverse();
        prop_assert_eq!(
            canonical_for(&words, page, size),
            canonical_for(&reversed, page, size)
        );
    }

    /// Re-extracting the joined output of an extraction changes nothing.
    #[test]
    fn extraction_is_stable(words in query_words()) {
        let first = extract_keywords(&words.join(" "));
        let second = extract_keywords(&first.join(" "));
        prop_assert_eq!(first, second);
    }

    /// Extraction never yields duplicates, stopwords or short tokens.
    #[test]
    fn extraction_output_is_clean(text in ".{0,200}") {
        let keywords = extract_keywords(&text);
        let unique: std::collections::HashSet<_> = keywords.iter().collect();
        prop_assert_eq!(unique.len(), keywords.len());
        for kw in &keywords {
            prop_assert!(kw.chars().count() >= 2, "stem too short: {}", kw);
            prop_assert!(!kw.contains(char::is_whitespace));
        }
    }

    /// Jaccard similarity is bounded, symmetric, and 1.0 on itself.
    #[test]
    fn jaccard_bounds_and_symmetry(a in query_words(), b in query_words()) {
        let a: Vec<String> = a.iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = b.iter().map(|s| s.to_string()).collect();

        let ab = jaccard_similarity(&a, &b);
        let ba = jaccard_similarity(&b, &a);

        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, ba);
        prop_assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    /// Normalization is idempotent and never reintroduces diacritics.
    #[test]
    fn normalization_is_idempotent(word in "\\PC{1,30}") {
        let once = normalize_keyword(&word);
        let twice = normalize_keyword(&once);
        prop_assert_eq!(&once, &twice);
    }
}
