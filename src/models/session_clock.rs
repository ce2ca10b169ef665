use serde::{Deserialize, Serialize};

/// Counts completed grading events; the time base for due checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionClock(u64);

impl SessionClock {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn tick(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = SessionClock::default();
        clock.tick();
        clock.tick();
        assert_eq!(clock.value(), 2);

        let mut saturated = SessionClock::new(u64::MAX);
        saturated.tick();
        assert_eq!(saturated.value(), u64::MAX);
    }
}
