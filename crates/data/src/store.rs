//! Day-keyed payload storage.
//!
//! A [`DayStore`] persists one opaque payload per calendar day. Every method
//! takes any timestamp within the day; implementations normalise it with
//! [`day_start`](binopt_core::time::day_start).

use binopt_core::Result;

/// Storage of one payload per UTC day.
pub trait DayStore {
    /// True if a payload exists for the day containing `day`.
    fn has_day(&self, day: i64) -> bool;

    /// Reads the payload for the day containing `day`.
    ///
    /// # Errors
    /// `NotFound` if nothing is stored for that day, `Io` on read failure.
    fn read_day(&mut self, day: i64) -> Result<Vec<u8>>;

    /// Stores `payload` for the day containing `day`, replacing any previous one.
    ///
    /// Writes may be buffered until [`flush`](Self::flush).
    ///
    /// # Errors
    /// `Io` if the write is rejected.
    fn write_day(&mut self, day: i64, payload: Vec<u8>) -> Result<()>;

    /// First and last stored day, `None` if the store is empty.
    ///
    /// # Errors
    /// `Io` if the store cannot be enumerated.
    fn min_max_day(&self) -> Result<Option<(i64, i64)>>;

    /// Makes buffered writes durable.
    ///
    /// # Errors
    /// `Io` if any buffered day cannot be written.
    fn flush(&mut self) -> Result<()>;

    /// Sets how many days around a read are cached. Ignored by stores without a cache.
    fn set_prefetch_window(&mut self, _days_past: u32, _days_future: u32) {}
}
