use binopt_core::time::day_start;
use binopt_core::{Result, WagerError};
use std::collections::BTreeMap;

use crate::store::DayStore;

/// In-memory [`DayStore`] for tests and throwaway runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryDayStore {
    days: BTreeMap<i64, Vec<u8>>,
    flushes: usize,
}

impl MemoryDayStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`DayStore::flush`] was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Removes a day, returning its payload.
    pub fn remove_day(&mut self, day: i64) -> Option<Vec<u8>> {
        self.days.remove(&day_start(day))
    }
}

impl DayStore for MemoryDayStore {
    fn has_day(&self, day: i64) -> bool {
        self.days.contains_key(&day_start(day))
    }

    fn read_day(&mut self, day: i64) -> Result<Vec<u8>> {
        let day = day_start(day);
        self.days
            .get(&day)
            .cloned()
            .ok_or(WagerError::NotFound { day })
    }

    fn write_day(&mut self, day: i64, payload: Vec<u8>) -> Result<()> {
        self.days.insert(day_start(day), payload);
        Ok(())
    }

    fn min_max_day(&self) -> Result<Option<(i64, i64)>> {
        let first = self.days.keys().next().copied();
        let last = self.days.keys().next_back().copied();
        Ok(first.zip(last))
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binopt_core::time::SECONDS_IN_DAY;

    #[test]
    fn test_keys_normalised_to_day_start() {
        let mut store = MemoryDayStore::new();
        store.write_day(SECONDS_IN_DAY + 500, vec![1, 2, 3]).unwrap();
        assert!(store.has_day(SECONDS_IN_DAY));
        assert!(store.has_day(2 * SECONDS_IN_DAY - 1));
        assert_eq!(store.read_day(SECONDS_IN_DAY + 7).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_day_is_not_found() {
        let mut store = MemoryDayStore::new();
        let err = store.read_day(SECONDS_IN_DAY * 3).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_min_max_day() {
        let mut store = MemoryDayStore::new();
        assert_eq!(store.min_max_day().unwrap(), None);
        store.write_day(SECONDS_IN_DAY * 5, vec![]).unwrap();
        store.write_day(SECONDS_IN_DAY * 2 + 10, vec![]).unwrap();
        assert_eq!(
            store.min_max_day().unwrap(),
            Some((SECONDS_IN_DAY * 2, SECONDS_IN_DAY * 5))
        );
    }
}
