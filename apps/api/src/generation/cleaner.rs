//! Text Cleaner: exact-match sentence dedup over generated text.
//!
//! Sentences are the fragments between literal ". " delimiters. Paraphrased
//! near-duplicates are kept; only identical fragments are removed.

const SENTENCE_DELIMITER: &str = ". ";

/// Removes repeated sentences, keeping first-seen order, and ends the text
/// with a single period. Empty input is returned unchanged.
///
/// Fragments are trimmed of surrounding whitespace and trailing periods before
/// comparison, so "A. B. A." collapses to "A. B.". The pass is idempotent.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut unique: Vec<&str> = Vec::new();
    for fragment in text.split(SENTENCE_DELIMITER) {
        let sentence = fragment
            .trim_start()
            .trim_end_matches(|c: char| c == '.' || c.is_whitespace());
        if !sentence.is_empty() && !unique.contains(&sentence) {
            unique.push(sentence);
        }
    }

    let mut result = unique.join(SENTENCE_DELIMITER);
    if !result.is_empty() && !result.ends_with('.') {
        result.push('.');
    }
    result
}
