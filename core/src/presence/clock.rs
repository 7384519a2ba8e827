//! Increasing clock ordering presence updates
//!
//! Presence is last-write-wins per peer: one counter per client.

/// Monotonic logical clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncreasingClock {
    value: u64,
}

impl IncreasingClock {
    /// Create a new clock starting at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value
    pub fn increment(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    /// Update to max of current and provided value
    pub fn update_to_max(&mut self, other: u64) {
        self.value = self.value.max(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_increment() {
        let mut clock = IncreasingClock::new();
        assert_eq!(clock.get(), 0);
        assert_eq!(clock.increment(), 1);
        assert_eq!(clock.increment(), 2);
        assert_eq!(clock.get(), 2);
    }

    #[test]
    fn test_clock_update_to_max() {
        let mut clock = IncreasingClock::new();
        clock.update_to_max(5);
        clock.update_to_max(3); // never decreases
        assert_eq!(clock.get(), 5);
        clock.update_to_max(10);
        assert_eq!(clock.get(), 10);
    }
}
