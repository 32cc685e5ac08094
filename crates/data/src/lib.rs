//! Wager journal storage for binary-option backtesting.
//!
//! This crate provides:
//! - The `DayStore` contract with file-backed and in-memory implementations
//! - JSON and fixed-width binary payload codecs
//! - `TradeJournal`: day-bucketed append/merge with duplicate suppression,
//!   range replay and look-ahead-free lookbacks
//! - CSV export of journal slices

pub mod codec;
pub mod csv_storage;
pub mod file_store;
pub mod filter;
pub mod journal;
pub mod memory_store;
pub mod store;

pub use codec::{codec_for, BinaryCodec, JsonCodec, RecordCodec, BINARY_RECORD_SIZE};
pub use csv_storage::CsvStorage;
pub use file_store::FileDayStore;
pub use filter::RecordFilter;
pub use journal::TradeJournal;
pub use memory_store::MemoryDayStore;
pub use store::DayStore;
