//! Manually advanced clock for tests.

use std::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Clock that only moves when told to.
///
/// Lets retry and TTL tests cover hours of schedule without sleeping.
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance_secs(&self, secs: u64) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now = now.plus_secs(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_on_demand_only() {
        let clock = ManualClock::new(Timestamp::from_unix_secs(1_000));
        assert_eq!(clock.now().as_unix_secs(), 1_000);

        clock.advance_secs(30);
        assert_eq!(clock.now().as_unix_secs(), 1_030);
    }
}
