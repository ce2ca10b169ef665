//! Card is a pair <question, reference answer>. Content never changes once authored.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier derived from card content, used to key scheduling state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Hashes question and answer so the id survives reordering of the deck.
    pub fn for_content(question: &str, reference_answer: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(question.as_bytes());
        hasher.update([0u8]);
        hasher.update(reference_answer.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CardId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub question: String,
    #[serde(rename = "answer", alias = "reference_answer")]
    pub reference_answer: String,
}

impl Card {
    pub fn new(question: impl Into<String>, reference_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            reference_answer: reference_answer.into(),
        }
    }

    pub fn id(&self) -> CardId {
        CardId::for_content(&self.question, &self.reference_answer)
    }
}
