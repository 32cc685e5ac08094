//! Settlement simulation for binary-option wagers.
//!
//! - [`SettlementEngine`]: close-time-ordered settlement on an explicit
//!   simulated clock, producing balance and equity curves
//! - [`OptimizationTester`]: sequential win/loss replay for ranking
//!   parameter sets

pub mod curve;
pub mod engine;
pub mod optimization;
pub mod report;

pub use curve::{Curve, CurvePoint};
pub use engine::SettlementEngine;
pub use optimization::OptimizationTester;
pub use report::{CurveKind, PerformanceReport};
