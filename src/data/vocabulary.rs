// ============================================================
// Layer 4 - Vocabulary and Sequence Encoder
// ============================================================
// Maps token sequences to fixed-length index sequences.
//
// Index layout:
//   0      padding
//   1      out-of-vocabulary
//   2..N   fitted words, most frequent first
//
// A vocabulary is fitted once and then frozen. Both classifiers
// hold the same `Arc<Vocabulary>`, so an encoded sequence means
// the same thing to each of them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::normalizer::{TextNormalizer, TokenSequence};
use crate::domain::error::{PipelineError, Result};

pub const PAD_INDEX: u32 = 0;
pub const OOV_INDEX: u32 = 1;
const RESERVED_INDICES: usize = 2;

// ─── EncodedSequence ──────────────────────────────────────────────────────────
/// Exactly `max_sequence_length` indices, zero-padded at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence(Vec<u32>);

impl EncodedSequence {
    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_ids(self) -> Vec<u32> {
        self.0
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    words:               Vec<String>,
    index:               HashMap<String, u32>,
    max_sequence_length: usize,
    max_vocab_size:      usize,
}

/// On-disk shape: the index map is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    max_sequence_length: usize,
    max_vocab_size:      usize,
    words:               Vec<String>,
}

impl TryFrom<VocabularyFile> for Vocabulary {
    type Error = PipelineError;

    fn try_from(file: VocabularyFile) -> Result<Self> {
        Vocabulary::from_words(file.words, file.max_vocab_size, file.max_sequence_length)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(v: Vocabulary) -> Self {
        Self {
            max_sequence_length: v.max_sequence_length,
            max_vocab_size:      v.max_vocab_size,
            words:               v.words,
        }
    }
}

impl Vocabulary {
    /// Counts tokens across the corpus and keeps the
    /// `max_vocab_size - 2` most frequent. Equal counts keep
    /// first-seen order.
    pub fn fit<'a>(
        corpus:              impl IntoIterator<Item = &'a TokenSequence>,
        max_vocab_size:      usize,
        max_sequence_length: usize,
    ) -> Result<Self> {
        Self::check_sizes(max_vocab_size, max_sequence_length)?;

        let mut counts:     Vec<(&str, usize)>   = Vec::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for sequence in corpus {
            for token in sequence.iter() {
                match first_seen.get(token) {
                    Some(&slot) => counts[slot].1 += 1,
                    None => {
                        first_seen.insert(token, counts.len());
                        counts.push((token, 1));
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let words = counts
            .into_iter()
            .take(max_vocab_size - RESERVED_INDICES)
            .map(|(w, _)| w.to_string())
            .collect::<Vec<_>>();

        tracing::debug!(
            "Vocabulary fitted: {} of {} distinct tokens kept",
            words.len(),
            first_seen.len()
        );

        Self::from_words(words, max_vocab_size, max_sequence_length)
    }

    /// Rebuilds a vocabulary from its ordered word list.
    pub fn from_words(words: Vec<String>, max_vocab_size: usize, max_sequence_length: usize) -> Result<Self> {
        Self::check_sizes(max_vocab_size, max_sequence_length)?;
        if words.len() > max_vocab_size - RESERVED_INDICES {
            return Err(PipelineError::invalid_input(format!(
                "{} words exceed the vocabulary cap of {max_vocab_size}",
                words.len()
            )));
        }

        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            if index.insert(word.clone(), (i + RESERVED_INDICES) as u32).is_some() {
                return Err(PipelineError::invalid_input(format!("duplicate vocabulary word '{word}'")));
            }
        }

        Ok(Self { words, index, max_sequence_length, max_vocab_size })
    }

    fn check_sizes(max_vocab_size: usize, max_sequence_length: usize) -> Result<()> {
        if max_vocab_size <= RESERVED_INDICES {
            return Err(PipelineError::invalid_input(format!(
                "max_vocab_size must exceed {RESERVED_INDICES}, got {max_vocab_size}"
            )));
        }
        if max_sequence_length == 0 {
            return Err(PipelineError::invalid_input("max_sequence_length must be positive"));
        }
        Ok(())
    }

    pub fn index_of(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(OOV_INDEX)
    }

    /// Unknown tokens map to OOV; the result is truncated or
    /// zero-padded at the end to `max_sequence_length`.
    pub fn encode(&self, tokens: &TokenSequence) -> EncodedSequence {
        let mut ids = tokens
            .iter()
            .take(self.max_sequence_length)
            .map(|t| self.index_of(t))
            .collect::<Vec<_>>();
        ids.resize(self.max_sequence_length, PAD_INDEX);
        EncodedSequence(ids)
    }

    /// Embedding rows needed: fitted words plus the two reserved indices.
    pub fn size(&self) -> usize {
        self.words.len() + RESERVED_INDICES
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    pub fn max_vocab_size(&self) -> usize {
        self.max_vocab_size
    }

    /// CRC32 over the sequence length and the ordered word list.
    /// Classifier artifacts record it to prove which vocabulary
    /// they were trained against.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&(self.max_sequence_length as u64).to_le_bytes());
        for word in &self.words {
            hasher.update(word.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize()
    }
}

// ─── SequenceEncoder ──────────────────────────────────────────────────────────
/// Normalizer plus frozen vocabulary: raw text in, model input out.
/// Cloning shares both halves.
#[derive(Clone)]
pub struct SequenceEncoder {
    normalizer: Arc<TextNormalizer>,
    vocabulary: Arc<Vocabulary>,
}

impl SequenceEncoder {
    pub fn new(normalizer: Arc<TextNormalizer>, vocabulary: Arc<Vocabulary>) -> Self {
        Self { normalizer, vocabulary }
    }

    pub fn with_default_normalizer(vocabulary: Arc<Vocabulary>) -> Self {
        Self::new(Arc::new(TextNormalizer::new()), vocabulary)
    }

    pub fn normalize(&self, text: &str) -> TokenSequence {
        self.normalizer.normalize(text)
    }

    pub fn encode_for_model(&self, text: &str) -> EncodedSequence {
        self.vocabulary.encode(&self.normalizer.normalize(text))
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn shares_vocabulary_with(&self, other: &SequenceEncoder) -> bool {
        Arc::ptr_eq(&self.vocabulary, &other.vocabulary)
    }
}
