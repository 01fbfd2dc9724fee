//! Entry-name tokenizer for the search index
//!
//! Pipeline: UAX#29 word boundaries → split on non-alphanumeric → lowercase
//!
//! File names are not prose, so there is no stemming and no stopword list:
//! "The Report.pdf" must still be findable by "the". Tokens never contain
//! the tab separator or the reserved 0xFF byte, which keeps them safe to
//! embed in index keys.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into searchable terms
///
/// # Example
///
/// ```
/// use mdindex_engine::search::tokenizer::tokenize;
///
/// let tokens = tokenize("Holiday_Photos 2015.JPG");
/// assert_eq!(tokens, vec!["holiday", "photos", "2015", "jpg"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .flat_map(|w| w.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokenize and deduplicate, keeping first-seen order
///
/// # Example
///
/// ```
/// use mdindex_engine::search::tokenizer::tokenize_unique;
///
/// let tokens = tokenize_unique("notes NOTES old-notes");
/// assert_eq!(tokens, vec!["notes", "old"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
