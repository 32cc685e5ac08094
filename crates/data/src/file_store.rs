//! Directory-backed day store.
//!
//! Each day is one file named `YYYY-MM-DD.<ext>` under the store directory.
//! Writes stay in memory until [`DayStore::flush`], which replaces each dirty
//! file atomically by writing a temporary sibling and renaming it into place.
//! Reads go through a cache that loads a window of neighbouring days, since
//! lookbacks walk backwards one day at a time.

use binopt_core::time::{date_of_timestamp, day_start, timestamp_of_date, SECONDS_IN_DAY};
use binopt_core::{PayloadEncoding, Result, WagerError};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TMP_SUFFIX: &str = "tmp";

/// [`DayStore`](crate::store::DayStore) over a directory of per-day files.
#[derive(Debug)]
pub struct FileDayStore {
    root: PathBuf,
    extension: &'static str,
    cache: BTreeMap<i64, Vec<u8>>,
    dirty: BTreeSet<i64>,
    days_past: u32,
    days_future: u32,
}

impl FileDayStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns `Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>, encoding: PayloadEncoding) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!(path = %root.display(), ext = encoding.extension(), "Opened day store");
        Ok(Self {
            root,
            extension: encoding.extension(),
            cache: BTreeMap::new(),
            dirty: BTreeSet::new(),
            days_past: 0,
            days_future: 0,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `day`.
    #[must_use]
    pub fn day_path(&self, day: i64) -> PathBuf {
        let day = day_start(day);
        let stem = date_of_timestamp(day)
            .map_or_else(|| day.to_string(), |d| d.format("%Y-%m-%d").to_string());
        self.root.join(format!("{stem}.{}", self.extension))
    }

    /// Number of days currently held in memory.
    #[must_use]
    pub fn cached_days(&self) -> usize {
        self.cache.len()
    }

    /// Loads `day` and its neighbours. Only a failure on `day` itself is an
    /// error; unreadable neighbours are logged and left uncached.
    fn load_window(&mut self, day: i64) -> Result<()> {
        let first = day - i64::from(self.days_past) * SECONDS_IN_DAY;
        let last = day + i64::from(self.days_future) * SECONDS_IN_DAY;

        let dirty = &self.dirty;
        self.cache
            .retain(|d, _| (first..=last).contains(d) || dirty.contains(d));

        let mut current = first;
        while current <= last {
            if !self.cache.contains_key(&current) {
                let path = self.day_path(current);
                match fs::read(&path) {
                    Ok(payload) => {
                        self.cache.insert(current, payload);
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) if current == day => return Err(e.into()),
                    Err(e) => {
                        warn!(day = current, path = %path.display(), error = %e, "Skipping unreadable neighbour day");
                    }
                }
            }
            current += SECONDS_IN_DAY;
        }
        debug!(day, cached = self.cache.len(), "Loaded prefetch window");
        Ok(())
    }

    fn stored_days(&self) -> Result<BTreeSet<i64>> {
        let mut days = BTreeSet::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension) {
                continue;
            }
            let parsed = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            if let Some(date) = parsed {
                days.insert(timestamp_of_date(date));
            }
        }
        Ok(days)
    }

    fn write_atomic(&self, day: i64, payload: &[u8]) -> Result<()> {
        let path = self.day_path(day);
        let tmp = path.with_extension(format!("{}.{TMP_SUFFIX}", self.extension));
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl crate::store::DayStore for FileDayStore {
    fn has_day(&self, day: i64) -> bool {
        let day = day_start(day);
        self.cache.contains_key(&day) || self.day_path(day).is_file()
    }

    fn read_day(&mut self, day: i64) -> Result<Vec<u8>> {
        let day = day_start(day);
        if !self.cache.contains_key(&day) {
            self.load_window(day)?;
        }
        self.cache
            .get(&day)
            .cloned()
            .ok_or(WagerError::NotFound { day })
    }

    fn write_day(&mut self, day: i64, payload: Vec<u8>) -> Result<()> {
        let day = day_start(day);
        self.cache.insert(day, payload);
        self.dirty.insert(day);
        Ok(())
    }

    fn min_max_day(&self) -> Result<Option<(i64, i64)>> {
        let mut days = self.stored_days()?;
        days.extend(self.dirty.iter().copied());
        Ok(days.first().copied().zip(days.last().copied()))
    }

    fn flush(&mut self) -> Result<()> {
        while let Some(&day) = self.dirty.first() {
            let payload = self.cache.get(&day).map(Vec::as_slice).unwrap_or_default();
            self.write_atomic(day, payload)?;
            self.dirty.remove(&day);
            debug!(day, bytes = payload.len(), "Flushed day");
        }
        Ok(())
    }

    fn set_prefetch_window(&mut self, days_past: u32, days_future: u32) {
        self.days_past = days_past;
        self.days_future = days_future;
    }
}
