use chrono::{DateTime, Utc};

/// Millisecond-timestamp ids that never repeat within a process.
///
/// Ids start from the wall clock but are bumped past the last issued id and
/// past any id the caller reports as taken, so two calls in the same
/// millisecond still get distinct values.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never issue an id at or below `floor`.
    pub fn observe(&mut self, floor: u64) {
        self.last = self.last.max(floor);
    }

    pub fn next_at(&mut self, now: DateTime<Utc>, taken: impl Fn(u64) -> bool) -> u64 {
        let clock = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let start = self.last.checked_add(1).map_or(clock, |floor| clock.max(floor));
        let candidate = Self::first_free(start, &taken)
            .or_else(|| Self::first_free(1, &taken))
            .unwrap_or(0);
        self.last = candidate;
        candidate
    }

    /// Lowest id at or above `start` that is not taken, if one exists below `u64::MAX`.
    fn first_free(start: u64, taken: &impl Fn(u64) -> bool) -> Option<u64> {
        let mut candidate = start;
        while taken(candidate) {
            candidate = candidate.checked_add(1)?;
        }
        Some(candidate)
    }

    pub fn next(&mut self, taken: impl Fn(u64) -> bool) -> u64 {
        self.next_at(Utc::now(), taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_same_tick_is_unique() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut ids = IdGenerator::new();
        let a = ids.next_at(now, |_| false);
        let b = ids.next_at(now, |_| false);
        assert_eq!(a, 1_700_000_000_000);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_skips_taken_ids() {
        let now = Utc.timestamp_millis_opt(500).unwrap();
        let mut ids = IdGenerator::new();
        let id = ids.next_at(now, |c| c == 500 || c == 501);
        assert_eq!(id, 502);
    }

    #[test]
    fn test_exhausted_range_wraps_to_lowest_free() {
        let now = Utc.timestamp_millis_opt(10).unwrap();
        let mut ids = IdGenerator::new();
        ids.observe(u64::MAX);
        assert_eq!(ids.next_at(now, |c| c == u64::MAX), 10);

        let mut ids = IdGenerator::new();
        ids.observe(u64::MAX - 1);
        assert_eq!(ids.next_at(now, |_| false), u64::MAX);
        let id = ids.next_at(now, |c| c == 10 || c == u64::MAX);
        assert_eq!(id, 11);
    }

    #[test]
    fn test_observe_sets_floor() {
        let now = Utc.timestamp_millis_opt(10).unwrap();
        let mut ids = IdGenerator::new();
        ids.observe(99);
        assert_eq!(ids.next_at(now, |_| false), 100);
    }
}
