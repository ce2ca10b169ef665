//! SM-2 (SuperMemo 2) scheduling, simplified to session-relative units.
//!
//! - Quality 0-2: the card starts over (repetitions 0, interval 1)
//! - Quality 3-5: interval grows 1 → 6 → interval × EF
//! - EF is adjusted after every review from the EF the card had *before* the
//!   review, and never falls below 1.3
//!
//! Intervals are compared against the session clock, so a unit is one graded
//! card, not one day.

use super::{CardScheduleState, MIN_EASINESS_FACTOR, Quality};

/// Computes the state a card moves to after being graded with `quality`.
pub fn next_state(current: &CardScheduleState, quality: Quality) -> CardScheduleState {
    let (repetitions, interval_units) = if quality.is_passing() {
        let interval = match current.repetitions {
            0 => 1,
            1 => 6,
            _ => (f64::from(current.interval_units) * current.easiness_factor).round() as u32,
        };
        (current.repetitions + 1, interval)
    } else {
        (0, 1)
    };

    CardScheduleState {
        repetitions,
        interval_units,
        easiness_factor: next_easiness(current.easiness_factor, quality),
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
fn next_easiness(easiness_factor: f64, quality: Quality) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    let updated = easiness_factor + (0.1 - miss * (0.08 + miss * 0.02));
    updated.max(MIN_EASINESS_FACTOR)
}
