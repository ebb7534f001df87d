// ============================================================
// Layer 4 — Vocabularies
// ============================================================
// Word vocabulary built from training-split word frequencies,
// and the label vocabulary.
//
//   id 0 → <pad>   (all-zero embedding row, masked out)
//   id 1 → <unk>   (out-of-vocabulary words)
//   id 2.. → words with frequency ≥ freq_threshold, most
//            frequent first, ties broken alphabetically
//
// Labels are sorted so the same dataset always yields the same
// label ids.

use std::collections::{BTreeSet, HashMap};

use crate::domain::error::RationaleError;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    word_to_id: HashMap<String, u32>,
    id_to_word: Vec<String>,
}

impl Vocabulary {
    /// Count word frequencies over tokenised sentences and keep every
    /// word seen at least `freq_threshold` times.
    pub fn build<'a, I, S>(sentences: I, freq_threshold: usize) -> Self
    where
        I: IntoIterator<Item = &'a [S]>,
        S: AsRef<str> + 'a,
    {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for sentence in sentences {
            for word in sentence {
                *freq.entry(word.as_ref()).or_insert(0) += 1;
            }
        }

        let mut words: Vec<(&str, usize)> = freq
            .into_iter()
            .filter(|(w, count)| *count >= freq_threshold && *w != PAD_TOKEN && *w != UNK_TOKEN)
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut id_to_word = vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()];
        id_to_word.extend(words.into_iter().map(|(w, _)| w.to_string()));
        Self::from_words(id_to_word)
    }

    fn from_words(id_to_word: Vec<String>) -> Self {
        let word_to_id = id_to_word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        Self { word_to_id, id_to_word }
    }

    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn id(&self, word: &str) -> u32 {
        self.word_to_id.get(word).copied().unwrap_or(UNK_ID)
    }

    pub fn word(&self, id: u32) -> &str {
        self.id_to_word.get(id as usize).map(String::as_str).unwrap_or(UNK_TOKEN)
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens.iter().map(|t| self.id(t.as_ref())).collect()
    }
}

// ─── Labels ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn build<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        let labels: BTreeSet<&str> = labels.into_iter().collect();
        Self { labels: labels.into_iter().map(String::from).collect() }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn id(&self, label: &str) -> Result<usize, RationaleError> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .map_err(|_| RationaleError::Data(format!("unknown label '{label}'")))
    }

    pub fn name(&self, id: usize) -> &str {
        self.labels.get(id).map(String::as_str).unwrap_or("?")
    }
}
