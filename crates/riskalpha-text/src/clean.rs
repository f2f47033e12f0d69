//! Deterministic text cleaning and tokenization.
//!
//! The same [`clean`] function is applied before fitting and before every
//! transform, so the vocabulary never sees text prepared differently from the
//! documents it later scores.

/// English stop words, sorted for binary search.
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "however", "if", "in",
    "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more", "most",
    "must", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "shall",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "upon", "us", "very", "was", "we", "were", "what",
    "when", "where", "whether", "which", "while", "who", "whom", "why", "will", "with",
    "within", "without", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Tokens shorter than this are dropped.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Whether `token` is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Clean raw disclosure text into a space-separated token stream.
///
/// Lowercases, treats every non-alphabetic character (digits included) as a
/// separator, then drops short tokens and stop words.
pub fn clean(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for token in lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(t))
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

/// Split cleaned text into tokens.
pub fn tokenize(cleaned: &str) -> Vec<&str> {
    cleaned.split_whitespace().collect()
}

/// Expand tokens into every n-gram of length `1..=ngram_max`.
///
/// N-grams are joined with a single space, matching how terms are displayed.
pub fn terms(tokens: &[&str], ngram_max: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len() * ngram_max.max(1));
    for n in 1..=ngram_max.max(1) {
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}
