//! Core types for binary-option wager backtesting.
//!
//! This crate provides:
//! - The wager record model and error kinds
//! - Day-clock helpers
//! - Statistics over balance/equity curves, generic over float precision
//! - Kelly and expectation math
//! - Optimisation scoring (circle centroid, best-3D distance)
//! - Configuration types and the figment-based loader

pub mod algorithms;
pub mod config;
pub mod config_loader;
pub mod counter;
pub mod error;
pub mod kelly;
pub mod record;
pub mod statistics;
pub mod time;
pub mod trig;

pub use config::{AppConfig, EngineConfig, JournalConfig, PayloadEncoding};
pub use config_loader::ConfigLoader;
pub use counter::WinLossCounter;
pub use error::{Result, WagerError};
pub use record::{DedupKey, Direction, WagerRecord, WagerResult, MAX_NAME_LEN};
pub use statistics::StatisticsSnapshot;
pub use trig::SinCosTable;
