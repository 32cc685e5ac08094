//! Day-bucketed wager journal.
//!
//! [`TradeJournal`] keeps one sorted bucket of [`WagerRecord`]s per UTC day in a
//! [`DayStore`]. New records collect in a write buffer for the current day; on
//! day rollover or [`save`](TradeJournal::save) the buffer is merged into the
//! stored bucket (read, drop duplicates, sort, overwrite).
//!
//! Lookbacks never see the future: a record only counts once its close time
//! is at or before the caller's as-of boundary.
//!
//! Reads go to the store only. Records still sitting in the write buffer are
//! invisible to `get` and the lookbacks until they are merged.

use binopt_core::time::{day_start, SECONDS_IN_DAY};
use binopt_core::{
    JournalConfig, PayloadEncoding, Result, WagerError, WagerRecord, WagerResult, WinLossCounter,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::codec::{codec_for, RecordCodec};
use crate::file_store::FileDayStore;
use crate::filter::RecordFilter;
use crate::store::DayStore;

/// Persistent journal of wager records, bucketed by open day.
pub struct TradeJournal<S: DayStore = FileDayStore> {
    store: S,
    codec: Box<dyn RecordCodec>,
    buffer: Vec<WagerRecord>,
    buffer_day: Option<i64>,
}

impl TradeJournal<FileDayStore> {
    /// Opens a file-backed journal as described by `config`.
    ///
    /// # Errors
    /// Returns `Io` if the journal directory cannot be created.
    pub fn open(config: &JournalConfig) -> Result<Self> {
        let mut store = FileDayStore::open(&config.path, config.encoding)?;
        store.set_prefetch_window(config.prefetch_days_past, config.prefetch_days_future);
        Ok(Self::new(store, config.encoding))
    }
}

/// Inserts `record` after any records with the same open time unless an
/// identical wager is already present. Returns whether it was inserted.
fn insert_sorted_unique(records: &mut Vec<WagerRecord>, record: WagerRecord) -> bool {
    let ts = record.timestamp();
    let lower = records.partition_point(|r| r.timestamp() < ts);
    let upper = records.partition_point(|r| r.timestamp() <= ts);
    if records[lower..upper].iter().any(|r| r.same_wager(&record)) {
        return false;
    }
    records.insert(upper, record);
    true
}

impl<S: DayStore> TradeJournal<S> {
    /// Creates a journal over `store` using the codec for `encoding`.
    #[must_use]
    pub fn new(store: S, encoding: PayloadEncoding) -> Self {
        Self::with_codec(store, codec_for(encoding))
    }

    /// Creates a journal over `store` with a custom codec.
    #[must_use]
    pub fn with_codec(store: S, codec: Box<dyn RecordCodec>) -> Self {
        Self {
            store,
            codec,
            buffer: Vec::new(),
            buffer_day: None,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Records waiting to be merged into the store.
    #[must_use]
    pub fn buffered(&self) -> &[WagerRecord] {
        &self.buffer
    }

    /// Adds a record to the write buffer.
    ///
    /// If the record belongs to a different day than the buffered records,
    /// the buffer is merged into the store first. A record identical to one
    /// already buffered is dropped.
    ///
    /// # Returns
    /// `true` if the record was buffered, `false` if it was a duplicate.
    ///
    /// # Errors
    /// Returns the merge error if the rollover merge fails; the new record is
    /// not accepted and the previous buffer is kept.
    pub fn add(&mut self, record: WagerRecord) -> Result<bool> {
        let day = day_start(record.timestamp());
        if self.buffer_day != Some(day) {
            self.merge_buffer()?;
            self.buffer_day = Some(day);
        }
        Ok(insert_sorted_unique(&mut self.buffer, record))
    }

    fn merge_buffer(&mut self) -> Result<()> {
        let Some(day) = self.buffer_day else {
            return Ok(());
        };
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut merged = match self.store.read_day(day) {
            Ok(payload) => self.codec.decode(&payload)?,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        merged.sort_by_key(WagerRecord::timestamp);
        let stored = merged.len();

        let mut added = 0_usize;
        for record in &self.buffer {
            if insert_sorted_unique(&mut merged, record.clone()) {
                added += 1;
            }
        }

        let payload = self.codec.encode(&merged)?;
        self.store.write_day(day, payload)?;
        debug!(day, stored, added, total = merged.len(), "Merged write buffer");
        self.buffer.clear();
        Ok(())
    }

    /// Merges the write buffer into the store and flushes the store.
    ///
    /// The store is flushed even when the merge fails, so days merged earlier
    /// still reach disk. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns the merge error if there was one, otherwise any flush error.
    /// On a merge error the buffer is kept for a later retry.
    pub fn save(&mut self) -> Result<()> {
        let pending = self.buffer.len();
        let merged = self.merge_buffer();
        let flushed = self.store.flush();
        if merged.is_ok() && flushed.is_ok() {
            info!(pending, "Saved journal");
        }
        merged.and(flushed)
    }

    /// Sorted records for the day containing `day`.
    ///
    /// # Errors
    /// `NotFound` if the day has no stored records, `Parser` if the payload
    /// cannot be decoded.
    pub fn get(&mut self, day: i64) -> Result<Vec<WagerRecord>> {
        let day = day_start(day);
        let payload = self.store.read_day(day)?;
        let mut records = self.codec.decode(&payload)?;
        if records.is_empty() {
            return Err(WagerError::NotFound { day });
        }
        records.sort_by_key(WagerRecord::timestamp);
        Ok(records)
    }

    /// Reads a day during a multi-day scan. Missing and unreadable days yield `None`.
    fn scan_read(&mut self, day: i64) -> Option<Vec<WagerRecord>> {
        match self.get(day) {
            Ok(records) => Some(records),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!(day, error = %e, "Skipping unreadable day");
                None
            }
        }
    }

    fn first_day(&self) -> Result<Option<i64>> {
        Ok(self.store.min_max_day()?.map(|(min, _)| day_start(min)))
    }

    /// Replays stored records day by day.
    ///
    /// For each day from `start` to `end` (inclusive) the records are grouped
    /// by exact open time, and `callback(group, timestamp)` is called for each
    /// group whose timestamp lies on the `step`-second grid anchored at the
    /// start of the day. Groups are visited in ascending time order.
    ///
    /// # Errors
    /// `InvalidParameter` for a zero step, `NoDataAccess` if no callback ran.
    pub fn range_replay<F>(&mut self, start: i64, end: i64, step: u32, mut callback: F) -> Result<()>
    where
        F: FnMut(&[WagerRecord], i64),
    {
        if step == 0 {
            return Err(WagerError::InvalidParameter("replay step must be positive".to_string()));
        }
        let step = i64::from(step);
        let last = day_start(end);
        let mut day = day_start(start);
        let mut groups = 0_usize;

        while day <= last {
            if let Some(records) = self.scan_read(day) {
                for group in records.chunk_by(|a, b| a.timestamp() == b.timestamp()) {
                    let ts = group[0].timestamp();
                    if (ts - day) % step == 0 {
                        callback(group, ts);
                        groups += 1;
                    }
                }
            }
            day += SECONDS_IN_DAY;
        }

        if groups == 0 {
            return Err(WagerError::NoDataAccess(format!(
                "no records between {start} and {end} at step {step}"
            )));
        }
        debug!(start, end, step, groups, "Replayed range");
        Ok(())
    }

    /// The most recent `count` records that had closed by `stop`.
    ///
    /// Scans backwards from the day containing `stop`, skipping records whose
    /// close time is after `stop` and records rejected by `filter`.
    ///
    /// # Errors
    /// `InvalidParameter` for a zero count, `NoDataAccess` if history runs
    /// out before `count` records are found.
    pub fn fixed_count_lookback(
        &mut self,
        stop: i64,
        count: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<WagerRecord>> {
        if count == 0 {
            return Err(WagerError::InvalidParameter("lookback count must be positive".to_string()));
        }
        let mut collected = Vec::new();
        if let Some(first) = self.first_day()? {
            let mut day = day_start(stop);
            while day >= first && collected.len() < count {
                if let Some(records) = self.scan_read(day) {
                    collected.extend(records.into_iter().filter(|r| {
                        r.close_timestamp() <= stop && filter.map_or(true, |f| f.matches(r))
                    }));
                }
                day -= SECONDS_IN_DAY;
            }
        }

        if collected.len() < count {
            return Err(WagerError::NoDataAccess(format!(
                "found {} of {count} records before {stop}",
                collected.len()
            )));
        }
        collected.sort_by_key(WagerRecord::timestamp);
        Ok(collected.split_off(collected.len() - count))
    }

    /// Visits day buckets backwards, starting with the day before the one
    /// containing `stop`.
    ///
    /// Records that close after the last second of that first day are
    /// trimmed from every bucket; buckets left empty are skipped. The scan
    /// stops when `visitor` returns `false` or history runs out.
    ///
    /// # Returns
    /// Number of buckets passed to `visitor`.
    ///
    /// # Errors
    /// Returns an error only if the store cannot report its day range.
    pub fn reverse_day_scan<F>(&mut self, stop: i64, mut visitor: F) -> Result<usize>
    where
        F: FnMut(i64, Vec<WagerRecord>) -> bool,
    {
        let Some(first) = self.first_day()? else {
            return Ok(0);
        };
        let anchor = day_start(stop) - SECONDS_IN_DAY;
        let protection = anchor + SECONDS_IN_DAY - 1;

        let mut visited = 0_usize;
        let mut day = anchor;
        while day >= first {
            if let Some(mut records) = self.scan_read(day) {
                records.retain(|r| r.close_timestamp() <= protection);
                if !records.is_empty() {
                    visited += 1;
                    if !visitor(day, records) {
                        break;
                    }
                }
            }
            day -= SECONDS_IN_DAY;
        }
        Ok(visited)
    }

    /// Collects up to `days` non-empty filtered day buckets before `stop`, newest first.
    fn collect_days(
        &mut self,
        stop: i64,
        days: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<(i64, Vec<WagerRecord>)>> {
        if days == 0 {
            return Err(WagerError::InvalidParameter("day window must be positive".to_string()));
        }
        let mut buckets = Vec::new();
        self.reverse_day_scan(stop, |day, mut records| {
            if let Some(f) = filter {
                records.retain(|r| f.matches(r));
            }
            if !records.is_empty() {
                buckets.push((day, records));
            }
            buckets.len() < days
        })?;

        if buckets.len() < days {
            return Err(WagerError::NoDataAccess(format!(
                "found {} of {days} days before {stop}",
                buckets.len()
            )));
        }
        Ok(buckets)
    }

    /// Records from the `days` most recent non-empty days strictly before the
    /// day containing `stop`, sorted ascending.
    ///
    /// Records closing after the end of the day preceding `stop`'s day are
    /// trimmed. Days with no records left after trimming and filtering do
    /// not count towards `days`.
    ///
    /// # Errors
    /// `InvalidParameter` for a zero window, `NoDataAccess` if fewer than
    /// `days` non-empty days exist.
    pub fn day_window_lookback(
        &mut self,
        stop: i64,
        days: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<WagerRecord>> {
        let buckets = self.collect_days(stop, days, filter)?;
        let mut records: Vec<WagerRecord> = buckets.into_iter().rev().flat_map(|(_, r)| r).collect();
        records.sort_by_key(WagerRecord::timestamp);
        Ok(records)
    }

    /// Win rate over [`fixed_count_lookback`](Self::fixed_count_lookback).
    ///
    /// # Errors
    /// Same as the lookback.
    pub fn win_rate_fixed_count(
        &mut self,
        stop: i64,
        count: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<f64> {
        let records = self.fixed_count_lookback(stop, count, filter)?;
        Ok(win_rate_of(&records))
    }

    /// Win rate over [`day_window_lookback`](Self::day_window_lookback).
    ///
    /// # Errors
    /// Same as the lookback.
    pub fn win_rate_days(
        &mut self,
        stop: i64,
        days: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<f64> {
        let records = self.day_window_lookback(stop, days, filter)?;
        Ok(win_rate_of(&records))
    }

    /// One win rate per counted day of the window, oldest first.
    ///
    /// # Errors
    /// Same as [`day_window_lookback`](Self::day_window_lookback).
    pub fn daily_win_rates(
        &mut self,
        stop: i64,
        days: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<f64>> {
        let buckets = self.collect_days(stop, days, filter)?;
        Ok(buckets
            .iter()
            .rev()
            .map(|(_, records)| win_rate_of(records))
            .collect())
    }

    /// Per-symbol daily win rates over the window, oldest first.
    ///
    /// The outer vector follows `symbols`. A symbol without records on a
    /// counted day gets 0 for that day.
    ///
    /// # Errors
    /// Same as [`day_window_lookback`](Self::day_window_lookback).
    pub fn symbol_daily_win_rates(
        &mut self,
        stop: i64,
        days: usize,
        symbols: &[u8],
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<Vec<f64>>> {
        let buckets = self.collect_days(stop, days, filter)?;
        Ok(symbols
            .iter()
            .map(|&symbol| {
                buckets
                    .iter()
                    .rev()
                    .map(|(_, records)| win_rate_of(records.iter().filter(|r| r.symbol() == symbol)))
                    .collect()
            })
            .collect())
    }

    /// Sorted distinct symbol names across every stored day.
    ///
    /// # Errors
    /// Returns an error only if the store cannot report its day range.
    pub fn unique_symbols(&mut self) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        if let Some((first, last)) = self.store.min_max_day()? {
            let mut day = day_start(first);
            while day <= last {
                if let Some(records) = self.scan_read(day) {
                    names.extend(records.into_iter().map(|r| r.name().to_string()));
                }
                day += SECONDS_IN_DAY;
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Number of distinct symbol names.
    ///
    /// # Errors
    /// See [`unique_symbols`](Self::unique_symbols).
    pub fn symbol_count(&mut self) -> Result<usize> {
        Ok(self.unique_symbols()?.len())
    }

    #[must_use]
    pub fn has_day(&self, day: i64) -> bool {
        self.store.has_day(day)
    }

    /// First and last stored day.
    ///
    /// # Errors
    /// Propagates store errors.
    pub fn min_max_day(&self) -> Result<Option<(i64, i64)>> {
        self.store.min_max_day()
    }

    pub fn set_prefetch_window(&mut self, days_past: u32, days_future: u32) {
        self.store.set_prefetch_window(days_past, days_future);
    }
}

impl<S: DayStore> Drop for TradeJournal<S> {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save journal on drop");
        }
    }
}

/// Win rate where anything but a win counts as a loss.
fn win_rate_of<'a>(records: impl IntoIterator<Item = &'a WagerRecord>) -> f64 {
    records
        .into_iter()
        .map(|r| match r.result() {
            WagerResult::Win => WagerResult::Win,
            _ => WagerResult::Loss,
        })
        .collect::<WinLossCounter>()
        .win_rate()
}
