// ============================================================
// Layer 4 - Text Normalizer
// ============================================================
// Turns raw feedback text into a sequence of normalised tokens.
// The same normalizer feeds vocabulary fitting, training and
// inference, so its output must be a pure function of the input.
//
// Steps (applied in this order, order changes the output):
//   1. Lowercase
//   2. Remove URLs, e-mail addresses, @mentions and #hashtags
//   3. Remove characters other than word chars, whitespace and . , ! ?
//   4. Collapse whitespace runs and trim
//   5. Split into words (whitespace split if the tokenizer fails)
//   6. Drop tokens made only of punctuation
//   7. Drop stopwords, keeping negation and intensity words
//   8. Lemmatize
//   9. Drop empty tokens
//
// Normalising already-normalised text is a no-op: a lemma that
// would land back in the stopword set keeps its surface form, so
// the second pass cannot remove it.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::data::lemmatizer::Lemmatizer;
use crate::domain::error::Result;

// ─── Patterns ─────────────────────────────────────────────────────────────────
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("valid URL pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+").expect("valid e-mail pattern"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+|#\w+").expect("valid handle pattern"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?]").expect("valid character-class pattern"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

// ─── Stopwords ────────────────────────────────────────────────────────────────
/// English stopwords (the NLTK list without apostrophe forms, which
/// step 3 can no longer produce).
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
    "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if",
    "or", "because", "as", "until", "while", "of", "at", "by", "for", "with",
    "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "can", "will", "just", "don", "should", "now", "d", "ll", "m",
    "o", "re", "ve", "y", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn",
    "haven", "isn", "ma", "mightn", "mustn", "needn", "shan", "shouldn", "wasn",
    "weren", "won", "wouldn",
];

/// Stopwords that carry negation or intensity and must survive.
pub const RETAINED_STOPWORDS: &[&str] = &["not", "no", "never", "very", "too", "but", "however"];

pub static FEEDBACK_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ENGLISH_STOPWORDS
        .iter()
        .copied()
        .filter(|w| !RETAINED_STOPWORDS.contains(w))
        .collect()
});

static DEFAULT_NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::new);

// ─── TokenSequence ────────────────────────────────────────────────────────────
/// Ordered normalised tokens of one text. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence(Vec<String>);

impl TokenSequence {
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Space-joined form, the text the classifiers effectively see.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

impl From<Vec<String>> for TokenSequence {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

// ─── Tokenizers ───────────────────────────────────────────────────────────────
/// Splits cleaned text into word units. A failing tokenizer is not
/// fatal: the normalizer falls back to a whitespace split.
pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;
}

/// Unicode word-boundary segmentation (UAX #29).
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentTokenizer;

impl WordTokenizer for SegmentTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text
            .split_word_bounds()
            .filter(|w| !w.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

// ─── TextNormalizer ───────────────────────────────────────────────────────────
pub struct TextNormalizer {
    tokenizer:  Box<dyn WordTokenizer>,
    stopwords:  &'static HashSet<&'static str>,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::with_tokenizer(Box::new(SegmentTokenizer))
    }

    pub fn with_tokenizer(tokenizer: Box<dyn WordTokenizer>) -> Self {
        Self {
            tokenizer,
            stopwords:  &FEEDBACK_STOPWORDS,
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Steps 1-4: character-level cleaning.
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let step    = URL_RE.replace_all(&lowered, "");
        let step    = EMAIL_RE.replace_all(&step, "");
        let step    = HANDLE_RE.replace_all(&step, "");
        let step    = DISALLOWED_RE.replace_all(&step, "");
        WHITESPACE_RE.replace_all(&step, " ").trim().to_string()
    }

    pub fn normalize(&self, text: &str) -> TokenSequence {
        let cleaned = self.clean(text);
        if cleaned.is_empty() {
            return TokenSequence::default();
        }

        let words = match self.tokenizer.tokenize(&cleaned) {
            Ok(words) => words,
            Err(e) => {
                tracing::debug!("Tokenizer failed ({e}), falling back to whitespace split");
                cleaned.split_whitespace().map(str::to_string).collect()
            }
        };

        let tokens = words
            .into_iter()
            .filter(|w| !is_punctuation(w))
            .filter(|w| !self.stopwords.contains(w.as_str()))
            .map(|w| self.lemma_of(w))
            .filter(|w| !w.trim().is_empty())
            .collect::<Vec<_>>();

        TokenSequence(tokens)
    }

    pub fn normalize_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<TokenSequence> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    fn lemma_of(&self, word: String) -> String {
        let lemma = self.lemmatizer.lemmatize(&word);
        if self.stopwords.contains(lemma.as_str()) {
            word
        } else {
            lemma
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_punctuation(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_punctuation())
}

// ─── Free functions ───────────────────────────────────────────────────────────
/// Normalises with the default tokenizer and stopword set.
pub fn normalize(text: &str) -> TokenSequence {
    DEFAULT_NORMALIZER.normalize(text)
}

/// Most frequent normalised tokens; equal counts keep first-occurrence order.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let tokens = normalize(text);

    let mut counts: Vec<(&str, usize)>   = Vec::new();
    let mut slot:   HashMap<&str, usize> = HashMap::new();
    for token in tokens.iter() {
        match slot.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // stable: ties stay in first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_n).map(|(t, _)| t.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    /// Characters in the raw input.
    pub original_length:  usize,
    pub token_count:      usize,
    pub unique_tokens:    usize,
    /// 0.0 when there are no tokens.
    pub avg_token_length: f64,
}

pub fn text_stats(text: &str) -> TextStats {
    let tokens = normalize(text);
    let unique = tokens.iter().collect::<HashSet<_>>().len();
    let avg    = if tokens.is_empty() {
        0.0
    } else {
        tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64 / tokens.len() as f64
    };

    TextStats {
        original_length:  text.chars().count(),
        token_count:      tokens.len(),
        unique_tokens:    unique,
        avg_token_length: avg,
    }
}
