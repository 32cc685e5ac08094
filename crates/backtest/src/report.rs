use serde::{Deserialize, Serialize};

/// Which curve a statistic is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// Committed capital net of open stakes.
    Balance,
    /// Realised value to date.
    #[default]
    Equity,
}

/// Summary of a settlement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub curve: CurveKind,
    pub start_balance: f64,
    pub final_balance: f64,
    pub final_equity: f64,
    pub wins: u64,
    pub losses: u64,
    pub neutrals: u64,
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
    pub profit_factor: f64,
    pub geometric_average_return: f64,
    pub sharpe_ratio: f64,
    pub drawdown_absolute: f64,
    pub drawdown_maximal: f64,
    pub drawdown_relative: f64,
    pub profit_stability: f64,
}
