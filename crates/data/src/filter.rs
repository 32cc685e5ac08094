//! Record selection for lookbacks.

use binopt_core::time::minute_of_day;
use binopt_core::WagerRecord;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&WagerRecord) -> bool + Send + Sync>;

/// Criteria a record must meet to be included in a lookback.
///
/// Every criterion that is set must match. The default filter accepts everything.
///
/// # Example
///
/// ```
/// use binopt_data::RecordFilter;
///
/// // EURUSD wagers opened between 08:00 and 12:00 UTC
/// let filter = RecordFilter::new()
///     .with_symbol_name("EURUSD")
///     .with_minute_window(8 * 60, 12 * 60);
/// ```
#[derive(Clone, Default)]
pub struct RecordFilter {
    symbol: Option<u8>,
    symbol_name: Option<String>,
    group: Option<u8>,
    minute_window: Option<(u32, u32)>,
    predicate: Option<Predicate>,
}

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: u8) -> Self {
        self.symbol = Some(symbol);
        self
    }

    #[must_use]
    pub fn with_symbol_name(mut self, name: impl Into<String>) -> Self {
        self.symbol_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = Some(group);
        self
    }

    /// Restricts to records opened in minutes `[start, stop)` of the UTC day.
    ///
    /// A window with `start > stop` wraps past midnight.
    #[must_use]
    pub fn with_minute_window(mut self, start: u32, stop: u32) -> Self {
        self.minute_window = Some((start, stop));
        self
    }

    /// Adds an arbitrary predicate.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&WagerRecord) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// True if `record` meets every criterion.
    #[must_use]
    pub fn matches(&self, record: &WagerRecord) -> bool {
        if self.symbol.is_some_and(|s| s != record.symbol()) {
            return false;
        }
        if self
            .symbol_name
            .as_deref()
            .is_some_and(|n| n != record.name())
        {
            return false;
        }
        if self.group.is_some_and(|g| g != record.group()) {
            return false;
        }
        if let Some((start, stop)) = self.minute_window {
            let minute = minute_of_day(record.timestamp());
            let inside = if start <= stop {
                minute >= start && minute < stop
            } else {
                minute >= start || minute < stop
            };
            if !inside {
                return false;
            }
        }
        self.predicate.as_ref().map_or(true, |p| p(record))
    }
}

impl fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFilter")
            .field("symbol", &self.symbol)
            .field("symbol_name", &self.symbol_name)
            .field("group", &self.group)
            .field("minute_window", &self.minute_window)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binopt_core::{Direction, WagerResult};

    const DAY: i64 = 1_546_300_800;

    fn record(name: &str, symbol: u8, timestamp: i64) -> WagerRecord {
        WagerRecord::new(name, symbol, Direction::Buy, WagerResult::Win, 60, timestamp)
    }

    #[test]
    fn test_default_accepts_everything() {
        assert!(RecordFilter::new().matches(&record("X", 9, DAY)));
    }

    #[test]
    fn test_symbol_and_name() {
        let by_index = RecordFilter::new().with_symbol(3);
        assert!(by_index.matches(&record("EURUSD", 3, DAY)));
        assert!(!by_index.matches(&record("EURUSD", 4, DAY)));

        let by_name = RecordFilter::new().with_symbol_name("EURUSD");
        assert!(by_name.matches(&record("EURUSD", 4, DAY)));
        assert!(!by_name.matches(&record("USDJPY", 4, DAY)));
    }

    #[test]
    fn test_group() {
        let filter = RecordFilter::new().with_group(2);
        assert!(filter.matches(&record("X", 0, DAY).with_group(2)));
        assert!(!filter.matches(&record("X", 0, DAY)));
    }

    #[test]
    fn test_minute_window_is_half_open() {
        let filter = RecordFilter::new().with_minute_window(60, 120);
        assert!(!filter.matches(&record("X", 0, DAY + 59 * 60)));
        assert!(filter.matches(&record("X", 0, DAY + 60 * 60)));
        assert!(filter.matches(&record("X", 0, DAY + 119 * 60 + 59)));
        assert!(!filter.matches(&record("X", 0, DAY + 120 * 60)));
    }

    #[test]
    fn test_minute_window_wraps_midnight() {
        let filter = RecordFilter::new().with_minute_window(23 * 60, 60);
        assert!(filter.matches(&record("X", 0, DAY + 23 * 3600 + 30)));
        assert!(filter.matches(&record("X", 0, DAY + 10)));
        assert!(!filter.matches(&record("X", 0, DAY + 12 * 3600)));
    }

    #[test]
    fn test_predicate() {
        let filter = RecordFilter::new().with_predicate(|r| r.duration() >= 120);
        assert!(!filter.matches(&record("X", 0, DAY)));
        assert!(format!("{filter:?}").contains("predicate: true"));
    }
}
