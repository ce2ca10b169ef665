use serde::{Deserialize, Serialize};

/// Easiness factor assigned to a card the first time it enters a deck.
pub const INITIAL_EASINESS_FACTOR: f64 = 2.5;

/// Easiness factor never drops below this value.
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Per-card SM-2 bookkeeping.
///
/// `interval_units` counts session-clock ticks, not days.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardScheduleState {
    pub repetitions: u32,
    pub interval_units: u32,
    pub easiness_factor: f64,
}

impl CardScheduleState {
    /// True for a card that has never been graded.
    pub fn is_fresh(&self) -> bool {
        self.repetitions == 0 && self.interval_units == 0
    }

    /// True once the card has been recalled successfully at least once.
    pub fn is_learned(&self) -> bool {
        self.repetitions >= 1
    }
}

impl Default for CardScheduleState {
    fn default() -> Self {
        Self {
            repetitions: 0,
            interval_units: 0,
            easiness_factor: INITIAL_EASINESS_FACTOR,
        }
    }
}
