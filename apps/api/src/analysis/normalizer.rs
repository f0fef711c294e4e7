//! Normalizer — turns raw text into the canonical token sequence used for matching.
//!
//! Steps: Unicode word segmentation → keep purely alphabetic tokens → lowercase →
//! drop English stopwords → reduce to the noun lemma.
//!
//! Output follows source order and keeps duplicates. Lemmatization is idempotent
//! and lemmas are re-checked against the stopword set, so normalizing the
//! space-joined output of `normalize` yields the same tokens again.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// English stopwords (alphabetic entries of the NLTK list).
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

/// Plurals that suffix rules get wrong, mapped to their lemma.
/// Words that are their own lemma are listed to stop suffix stripping.
const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("apis", "api"),
    ("caches", "cache"),
    ("children", "child"),
    ("cookies", "cookie"),
    ("criteria", "criterion"),
    ("devops", "devops"),
    ("diagnoses", "diagnosis"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("indices", "index"),
    ("jenkins", "jenkins"),
    ("knives", "knife"),
    ("kubernetes", "kubernetes"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("macos", "macos"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("movies", "movie"),
    ("news", "news"),
    ("niches", "niche"),
    ("pandas", "pandas"),
    ("phenomena", "phenomenon"),
    ("postgres", "postgres"),
    ("series", "series"),
    ("species", "species"),
    ("teeth", "tooth"),
    ("vertices", "vertex"),
    ("wives", "wife"),
    ("women", "woman"),
];

/// Endings that look plural but are not.
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is", "ics", "js"];

pub struct Normalizer {
    stop_words: HashSet<&'static str>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Normalizes `text` into lemmatized, stopword-free, lowercase tokens.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter(|word| word.chars().all(char::is_alphabetic))
            .map(str::to_lowercase)
            .filter(|word| !self.is_stop_word(word))
            .map(|word| lemmatize(&word))
            .filter(|lemma| !self.is_stop_word(lemma))
            .collect()
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}

/// Reduces a lowercase word to its noun lemma.
///
/// The irregular table is consulted again on the stripped stem, so a
/// doubly-pluralized irregular ("criterias") lands on the same lemma as its
/// plain plural and a second pass changes nothing.
pub fn lemmatize(word: &str) -> String {
    let stem = strip_plural(word);
    match irregular_lemma(&stem) {
        Some(lemma) => lemma.to_string(),
        None => stem,
    }
}

fn irregular_lemma(word: &str) -> Option<&'static str> {
    IRREGULAR_LEMMAS
        .iter()
        .find(|(plural, _)| *plural == word)
        .map(|(_, lemma)| *lemma)
}

fn strip_plural(word: &str) -> String {
    if let Some(lemma) = irregular_lemma(word) {
        return lemma.to_string();
    }

    if word.chars().count() <= 3 || PROTECTED_ENDINGS.iter().any(|end| word.ends_with(end)) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }
    for suffix in ["xes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }

    word.to_string()
}
