//! Picks the next card to present.
//!
//! A card is due when it has zero repetitions and its interval is within the
//! clock. Fresh cards have interval 0 and are therefore always due, so the
//! pick is simply the first due card in deck order. A card recalled once
//! leaves the rotation for the rest of the session.

use super::{CardScheduleState, Deck, SessionClock};

/// Index of the next card to present, or `None` when the session is done.
pub fn select_next(deck: &Deck, clock: SessionClock) -> Option<usize> {
    deck.entries.iter().position(|entry| is_due(&entry.state, clock))
}

/// Number of cards the selector could still hand out at `clock`.
pub fn pending_count(deck: &Deck, clock: SessionClock) -> usize {
    deck.entries
        .iter()
        .filter(|entry| is_due(&entry.state, clock))
        .count()
}

fn is_due(state: &CardScheduleState, clock: SessionClock) -> bool {
    state.repetitions == 0 && u64::from(state.interval_units) <= clock.value()
}
