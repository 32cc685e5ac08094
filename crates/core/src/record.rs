//! Wager record model.
//!
//! A [`WagerRecord`] is one timed binary-option bet: which symbol, which way,
//! how long it ran and how it ended. Records are immutable once built.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WagerError;

/// Maximum length of a symbol name in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Direction of a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    /// Bet on the price rising.
    Buy,
    /// Bet on the price falling.
    Sell,
    /// No position was taken.
    NoBet,
}

impl Direction {
    /// Wire value: buy = 1, sell = -1, no bet = 0.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
            Self::NoBet => 0,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = WagerError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Buy),
            -1 => Ok(Self::Sell),
            0 => Ok(Self::NoBet),
            other => Err(WagerError::Parser(format!("invalid direction {other}"))),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        direction.as_i8()
    }
}

/// Outcome of a settled wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum WagerResult {
    Win,
    Loss,
    /// Neither win nor loss (price closed at the strike).
    Neutral,
}

impl WagerResult {
    /// Wire value: win = 1, loss = -1, neutral = 0.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Win => 1,
            Self::Loss => -1,
            Self::Neutral => 0,
        }
    }

    /// True for win or loss.
    #[must_use]
    pub fn is_definite(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl TryFrom<i8> for WagerResult {
    type Error = WagerError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Win),
            -1 => Ok(Self::Loss),
            0 => Ok(Self::Neutral),
            other => Err(WagerError::Parser(format!("invalid result {other}"))),
        }
    }
}

impl From<WagerResult> for i8 {
    fn from(result: WagerResult) -> Self {
        result.as_i8()
    }
}

/// Content key identifying a wager. Two records with equal keys are the same wager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub timestamp: i64,
    pub symbol: u8,
    pub direction: Direction,
    pub result: WagerResult,
    pub duration: u32,
    pub group: u8,
    pub name: &'a str,
}

/// One journaled wager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerRecord {
    #[serde(deserialize_with = "deserialize_name")]
    name: String,
    symbol: u8,
    group: u8,
    direction: Direction,
    result: WagerResult,
    duration: u32,
    timestamp: i64,
    #[serde(default, rename = "winrate", deserialize_with = "deserialize_hint")]
    win_rate_hint: f32,
}

impl WagerRecord {
    /// Creates a new record.
    ///
    /// # Arguments
    /// * `name` - Symbol display name, cut at the first NUL and truncated to
    ///   32 bytes on a char boundary
    /// * `symbol` - Symbol index
    /// * `direction` - Buy, sell or no bet
    /// * `result` - Win, loss or neutral
    /// * `duration` - Expiry in seconds
    /// * `timestamp` - Open time, unix seconds
    #[must_use]
    pub fn new(
        name: &str,
        symbol: u8,
        direction: Direction,
        result: WagerResult,
        duration: u32,
        timestamp: i64,
    ) -> Self {
        Self {
            name: truncate_name(name).to_string(),
            symbol,
            group: 0,
            direction,
            result,
            duration,
            timestamp,
            win_rate_hint: 0.0,
        }
    }

    /// Sets the group tag.
    #[must_use]
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = group;
        self
    }

    /// Sets the forecast win-rate carried with the record. Non-finite values become 0.
    #[must_use]
    pub fn with_win_rate_hint(mut self, hint: f32) -> Self {
        self.win_rate_hint = finite_hint(hint);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    #[must_use]
    pub fn group(&self) -> u8 {
        self.group
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn result(&self) -> WagerResult {
        self.result
    }

    #[must_use]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Open time, unix seconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn win_rate_hint(&self) -> f32 {
        self.win_rate_hint
    }

    /// Open time plus duration.
    #[must_use]
    pub fn close_timestamp(&self) -> i64 {
        self.timestamp.saturating_add(i64::from(self.duration))
    }

    /// Content key used for duplicate suppression. The win-rate hint is not part of it.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            timestamp: self.timestamp,
            symbol: self.symbol,
            direction: self.direction,
            result: self.result,
            duration: self.duration,
            group: self.group,
            name: &self.name,
        }
    }

    /// True if both records describe the same wager.
    #[must_use]
    pub fn same_wager(&self, other: &Self) -> bool {
        self.dedup_key() == other.dedup_key()
    }
}

impl fmt::Display for WagerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} {:?} {:?} {}s @ {}",
            self.name, self.symbol, self.direction, self.result, self.duration, self.timestamp
        )
    }
}

fn deserialize_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(truncate_name(&name).to_string())
}

fn deserialize_hint<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let hint = Option::<f32>::deserialize(deserializer)?;
    Ok(hint.map_or(0.0, finite_hint))
}

fn finite_hint(hint: f32) -> f32 {
    if hint.is_finite() {
        hint
    } else {
        0.0
    }
}

fn truncate_name(name: &str) -> &str {
    let name = name.split('\0').next().unwrap_or_default();
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
