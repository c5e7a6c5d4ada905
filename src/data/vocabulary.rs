// ============================================================
// Layer 4: Vocabulary Builder
// ============================================================
// Turns the flat training token list into a bidirectional
// word ↔ index mapping.
//
// Index assignment:
//   1. Count how often every token occurs
//   2. Order distinct tokens by descending count
//   3. Ties keep first-seen order (the token that appeared
//      earlier in the list gets the lower index)
//   4. Append <PAD> last, so it always has the highest index
//
// Example: ["a", "cat", "a", "dog"]
//   a → 0, cat → 1, dog → 2, <PAD> → 3
//
// The mapping is built once from the train split and shared,
// read-only, by validation and inference for decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::caption::PAD_TOKEN;

/// Dense word ↔ index mapping. Indices are `0..len()` with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    word_to_index: HashMap<String, usize>,
    index_to_word: Vec<String>,
}

/// On-disk form: the index → word list is enough to rebuild both sides.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    words: Vec<String>,
}

impl TryFrom<VocabularyFile> for Vocabulary {
    type Error = anyhow::Error;

    /// Rejects lists that could not have come from `build_vocabulary`:
    /// repeated words, or a last entry other than `<PAD>`.
    fn try_from(file: VocabularyFile) -> anyhow::Result<Self> {
        if file.words.last().map(String::as_str) != Some(PAD_TOKEN) {
            anyhow::bail!("vocabulary must end with {PAD_TOKEN}");
        }
        let vocab = Vocabulary::from_words(file.words);
        if vocab.word_to_index.len() != vocab.index_to_word.len() {
            anyhow::bail!("vocabulary contains duplicate words");
        }
        Ok(vocab)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocab: Vocabulary) -> Self {
        VocabularyFile { words: vocab.index_to_word }
    }
}

/// Build the vocabulary from a token list. An empty list yields a
/// vocabulary holding only the padding symbol.
pub fn build_vocabulary<S: AsRef<str>>(tokens: &[S]) -> Vocabulary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            first_seen.push(token);
        }
        *count += 1;
    }

    // sort_by is stable, so equal counts keep first-seen order
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let mut words: Vec<String> = first_seen.into_iter().map(str::to_string).collect();
    words.push(PAD_TOKEN.to_string());

    tracing::debug!("Built vocabulary of {} entries from {} tokens", words.len(), tokens.len());
    Vocabulary::from_words(words)
}

impl Vocabulary {
    fn from_words(index_to_word: Vec<String>) -> Self {
        let word_to_index = index_to_word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        Self { word_to_index, index_to_word }
    }

    pub fn word_to_index(&self) -> &HashMap<String, usize> {
        &self.word_to_index
    }

    pub fn index_to_word(&self) -> &[String] {
        &self.index_to_word
    }

    pub fn index(&self, word: &str) -> Option<usize> {
        self.word_to_index.get(word).copied()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.index_to_word.get(index).map(String::as_str)
    }

    /// Index of the padding symbol, always the highest index
    pub fn pad_index(&self) -> usize {
        self.index_to_word.len().saturating_sub(1)
    }

    /// Number of entries, padding included
    pub fn len(&self) -> usize {
        self.index_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_word.is_empty()
    }

    /// Map a normalised caption to indices. Tokens that never occurred
    /// in the training split are skipped.
    pub fn encode(&self, caption: &str) -> Vec<usize> {
        caption
            .split_whitespace()
            .filter_map(|token| {
                let idx = self.index(token);
                if idx.is_none() {
                    tracing::trace!("Skipping out-of-vocabulary token '{token}'");
                }
                idx
            })
            .collect()
    }

    /// Map indices back to words; unknown indices are skipped.
    pub fn decode(&self, indices: &[usize]) -> Vec<&str> {
        indices.iter().filter_map(|&i| self.word(i)).collect()
    }
}
