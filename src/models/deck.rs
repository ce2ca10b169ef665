//! Deck is an ordered set of cards together with each card's scheduling state.
use super::{Card, CardId, CardScheduleState, MIN_EASINESS_FACTOR, SessionClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;

const MAX_DECK_ID_LEN: usize = 50;
const DECK_ID_HASH_LEN: usize = 12;

/// Key under which a learner's progress on a deck is stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(String);

impl DeckId {
    /// Readable slug of the title followed by a hash of the exact title.
    ///
    /// The slug lowercases the title, drops anything that is not `[a-z0-9]` or
    /// whitespace, joins words with `_` and keeps at most 50 characters. Titles
    /// that slug the same ("Wiskunde", "wiskunde!") still get distinct ids.
    pub fn from_title(title: &str) -> Self {
        let digest = hex::encode(Sha256::digest(title.as_bytes()));
        let hash = &digest[..DECK_ID_HASH_LEN];

        let slug = Self::slug(title);
        if slug.is_empty() {
            Self(hash.to_string())
        } else {
            Self(format!("{slug}-{hash}"))
        }
    }

    fn slug(title: &str) -> String {
        let lowered = title.to_lowercase();
        let kept: String = lowered
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
            .collect();

        let mut id = String::with_capacity(kept.len());
        let mut in_space = false;
        for c in kept.chars() {
            if c.is_whitespace() {
                if !in_space {
                    id.push('_');
                }
                in_space = true;
            } else {
                id.push(c);
                in_space = false;
            }
        }
        id.truncate(MAX_DECK_ID_LEN);
        id
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeckId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeckEntry {
    pub id: CardId,
    pub card: Card,
    pub state: CardScheduleState,
}

impl DeckEntry {
    pub fn new(card: Card) -> Self {
        Self {
            id: card.id(),
            card,
            state: CardScheduleState::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub entries: Vec<DeckEntry>,
}

impl Deck {
    /// Builds a deck with fresh states. A repeated question keeps only its first card.
    pub fn new(name: impl Into<String>, cards: Vec<Card>) -> Self {
        let name = name.into();
        let mut seen = HashSet::new();
        let entries = cards
            .into_iter()
            .filter(|card| seen.insert(card.question.clone()))
            .map(DeckEntry::new)
            .collect();
        Self {
            id: DeckId::from_title(&name),
            name,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DeckEntry> {
        self.entries.get(index)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.entries.iter().map(|entry| &entry.card)
    }

    /// Captures every card's state plus the clock for persistence.
    pub fn snapshot(&self, clock: SessionClock) -> DeckSnapshot {
        DeckSnapshot {
            clock,
            states: self
                .entries
                .iter()
                .map(|entry| (entry.id.clone(), entry.state))
                .collect(),
            updated_at: Utc::now(),
        }
    }

    /// Copies saved states onto matching cards and returns the saved clock.
    ///
    /// Saved states for cards no longer in the deck are ignored; cards without
    /// a saved state keep what they have. Stored easiness factors are floored
    /// at 1.3.
    pub fn restore(&mut self, snapshot: &DeckSnapshot) -> SessionClock {
        let saved: HashMap<&CardId, &CardScheduleState> =
            snapshot.states.iter().map(|(id, state)| (id, state)).collect();

        for entry in &mut self.entries {
            if let Some(state) = saved.get(&entry.id) {
                entry.state = CardScheduleState {
                    easiness_factor: state.easiness_factor.max(MIN_EASINESS_FACTOR),
                    ..**state
                };
            }
        }
        snapshot.clock
    }
}

/// Durable copy of a deck's scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub clock: SessionClock,
    pub states: Vec<(CardId, CardScheduleState)>,
    pub updated_at: DateTime<Utc>,
}
