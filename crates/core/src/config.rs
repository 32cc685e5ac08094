use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// On-disk encoding of day payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// JSON array of records, human readable.
    #[default]
    Json,
    /// Fixed-width 52-byte records.
    Binary,
}

impl PayloadEncoding {
    /// File extension used for day files.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "bin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory holding one file per day.
    pub path: PathBuf,
    pub encoding: PayloadEncoding,
    /// Days before a requested day to load into the read cache.
    pub prefetch_days_past: u32,
    /// Days after a requested day to load into the read cache.
    pub prefetch_days_future: u32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/journal"),
            encoding: PayloadEncoding::Json,
            prefetch_days_past: 7,
            prefetch_days_future: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub start_balance: f64,
    /// Simulated clock at start, unix seconds.
    pub start_timestamp: i64,
    /// Broker payout on a win, per unit staked.
    pub payout: f64,
    /// Absolute stake when >= 1.0, otherwise a fraction of the balance.
    pub stake: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_balance: 1000.0,
            start_timestamp: 0,
            payout: 0.8,
            stake: 10.0,
        }
    }
}
