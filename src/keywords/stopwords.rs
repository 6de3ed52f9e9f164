//! Combined English + Portuguese stopword table.
//!
//! Tokens matching an entry here never become keywords. The table covers the
//! high-frequency function words of both languages the search frontend
//! serves; checks happen after lowercasing, before stemming.

/// Words excluded from keyword extraction.
pub const STOPWORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had",
    "her", "was", "one", "our", "out", "day", "get", "has", "him", "his",
    "how", "man", "new", "now", "old", "see", "two", "way", "who", "its",
    "did", "yes", "with", "this", "that", "from", "they", "will", "have",
    "been", "were", "said", "each", "which", "their", "them", "then", "than",
    "some", "what", "when", "where", "your", "would", "there", "could",
    "other", "into", "more", "these", "those", "only", "over", "such",
    "most", "very", "just", "also", "about", "after", "before", "between",
    "both", "does", "down", "during", "here", "much", "must", "should",
    "under", "while", "because", "being", "same", "any",
    // Portuguese (accented and folded spellings both appear: the stopword
    // check runs before any diacritic normalization)
    "que", "nao", "não", "uma", "com", "por", "mais", "das", "dos", "como",
    "mas", "foi", "ele", "ela", "seu", "sua", "ter", "quando", "muito",
    "nos", "sem", "meu", "minha", "numa", "pelos", "elas", "qual", "nossa",
    "nosso", "essa", "esse", "esta", "está", "este", "isso", "isto",
    "aquela", "aquele", "entre", "depois", "antes", "tambem", "também",
    "pela", "pelo", "ate", "até", "era", "eram", "sao", "são", "ser", "tem",
    "tinha", "fosse", "sobre", "para", "vai", "vao", "vão", "somos", "estou",
    "estava", "estao", "estão", "fazer", "onde", "quem", "cada", "todo",
    "toda", "todos", "todas", "outro", "outra", "ainda", "assim", "nem",
    "seus", "suas", "voce", "você", "lhe", "lhes", "aos", "nas", "num",
    "uns", "umas",
];

/// Whether a lowercased token is a stopword.
#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_stopwords() {
        assert!(is_stopword("the"));
        assert!(is_stopword("for"));
        assert!(is_stopword("with"));
    }

    #[test]
    fn test_portuguese_stopwords() {
        assert!(is_stopword("que"));
        assert!(is_stopword("para"));
        assert!(is_stopword("quando"));
    }

    #[test]
    fn test_content_words_pass() {
        assert!(!is_stopword("laptop"));
        assert!(!is_stopword("charger"));
        assert!(!is_stopword("notebook"));
    }

    #[test]
    fn test_table_is_lowercase_and_deduplicated() {
        let mut seen = std::collections::HashSet::new();
        for word in STOPWORDS {
            assert_eq!(*word, word.to_lowercase(), "stopword not lowercase: {word}");
            assert!(seen.insert(*word), "duplicate stopword: {word}");
        }
    }
}
