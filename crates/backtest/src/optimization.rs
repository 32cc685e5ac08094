//! Lightweight tester for parameter sweeps.
//!
//! Where [`SettlementEngine`](crate::SettlementEngine) models overlapping
//! wagers in time, [`OptimizationTester`] treats a strategy run as a plain
//! sequence of wins and losses settled one after another. That is enough to
//! rank thousands of parameter sets by win rate, stability and equity growth.

use binopt_core::algorithms::{self, Best3dWeights, CentroidMode};
use binopt_core::trig::fast_inv_sqrt;
use binopt_core::{kelly, statistics, SinCosTable, WagerRecord, WagerResult};

/// Sequential win/loss tester.
#[derive(Debug, Clone, Default)]
pub struct OptimizationTester {
    outcomes: Vec<bool>,
    wins: u32,
    losses: u32,
    start_balance: f64,
    equity: Vec<f64>,
    gross_profit: f64,
    gross_loss: f64,
}

impl OptimizationTester {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tester from journal records, in order. Anything but a win
    /// is taken as a loss.
    #[must_use]
    pub fn from_records(records: &[WagerRecord]) -> Self {
        let mut tester = Self::new();
        tester.extend(records.iter().map(|r| match r.result() {
            WagerResult::Win => WagerResult::Win,
            _ => WagerResult::Loss,
        }));
        tester
    }

    /// Records one outcome. Neutral results are ignored.
    pub fn add(&mut self, result: WagerResult) {
        match result {
            WagerResult::Win => {
                self.outcomes.push(true);
                self.wins += 1;
            }
            WagerResult::Loss => {
                self.outcomes.push(false);
                self.losses += 1;
            }
            WagerResult::Neutral => {}
        }
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = WagerResult>) {
        for result in results {
            self.add(result);
        }
    }

    /// Outcome sequence, `true` for a win.
    #[must_use]
    pub fn outcomes(&self) -> &[bool] {
        &self.outcomes
    }

    #[must_use]
    pub fn wins(&self) -> u32 {
        self.wins
    }

    #[must_use]
    pub fn losses(&self) -> u32 {
        self.losses
    }

    #[must_use]
    pub fn deals(&self) -> u32 {
        self.wins + self.losses
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        let deals = self.deals();
        if deals == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(deals)
    }

    /// Coefficient of variation of the win/loss sequence: sample standard
    /// deviation over the win rate. Lower means steadier results.
    ///
    /// Returns 0 with fewer than two outcomes or no wins.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn win_rate_coefficient_of_variation(&self) -> f32 {
        let n = self.outcomes.len();
        let mean = self.win_rate() as f32;
        if n < 2 || mean == 0.0 {
            return 0.0;
        }
        let sum: f32 = self
            .outcomes
            .iter()
            .map(|&win| {
                let diff = f32::from(u8::from(win)) - mean;
                diff * diff
            })
            .sum();
        let variance = sum / (n - 1) as f32;
        if variance == 0.0 {
            return 0.0;
        }
        (1.0 / fast_inv_sqrt(variance)) / mean
    }

    /// Circle-centroid stability of the outcome sequence. See
    /// [`centroid_circle`](algorithms::centroid_circle).
    #[must_use]
    pub fn stability(&self, revolutions: u32, mode: CentroidMode, table: &SinCosTable) -> f32 {
        algorithms::centroid_circle(&self.outcomes, revolutions, mode, table)
    }

    /// Distance to the ideal strategy; `f32::MAX` with no outcomes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coeff_best_3d(
        &self,
        max_deals: u32,
        revolutions: u32,
        mode: CentroidMode,
        table: &SinCosTable,
        weights: &Best3dWeights,
    ) -> f32 {
        if self.outcomes.is_empty() {
            return f32::MAX;
        }
        algorithms::coeff_best_3d(
            self.win_rate() as f32,
            self.stability(revolutions, mode, table),
            self.deals() as f32,
            max_deals as f32,
            weights,
        )
    }

    #[must_use]
    pub fn expected_payoff(&self, payout: f64, loss: f64) -> f64 {
        kelly::expected_payoff(self.win_rate(), payout, loss)
    }

    /// Replays the outcomes as back-to-back wagers and derives the equity curve.
    ///
    /// `stake` is absolute when >= 1.0, otherwise a fraction of current
    /// equity. The run stops at the first loss that leaves equity at or
    /// below zero.
    pub fn simulate_equity(&mut self, start_balance: f64, payout: f64, stake: f64) {
        self.start_balance = start_balance;
        self.equity.clear();
        self.equity.reserve(self.outcomes.len() + 1);
        self.equity.push(start_balance);

        let mut equity = start_balance;
        for &win in &self.outcomes {
            let risk = if stake >= 1.0 { stake } else { stake * equity };
            if win {
                equity += risk * payout;
            } else {
                equity -= risk;
            }
            self.equity.push(equity);
            if !win && equity <= 0.0 {
                break;
            }
        }

        let snapshot = statistics::StatisticsSnapshot::from_curve(&self.equity);
        self.gross_profit = snapshot.gross_profit;
        self.gross_loss = snapshot.gross_loss;
    }

    /// Curve from the last [`simulate_equity`](Self::simulate_equity) call.
    #[must_use]
    pub fn equity_curve(&self) -> &[f64] {
        &self.equity
    }

    #[must_use]
    pub fn gross_profit(&self) -> f64 {
        self.gross_profit
    }

    #[must_use]
    pub fn gross_loss(&self) -> f64 {
        self.gross_loss
    }

    #[must_use]
    pub fn net_profit(&self) -> f64 {
        self.gross_profit - self.gross_loss
    }

    #[must_use]
    pub fn profit_factor(&self) -> f64 {
        statistics::profit_factor(self.gross_profit, self.gross_loss)
    }

    /// Final equity over starting balance; 1.0 before any simulation.
    #[must_use]
    pub fn gain(&self) -> f64 {
        match self.equity.last() {
            Some(last) if self.start_balance != 0.0 => last / self.start_balance,
            _ => 1.0,
        }
    }

    #[must_use]
    pub fn sharpe_ratio(&self) -> f64 {
        statistics::sharpe_ratio(&self.equity)
    }

    #[must_use]
    pub fn drawdown_absolute(&self) -> f64 {
        statistics::drawdown_absolute(&self.equity)
    }

    #[must_use]
    pub fn drawdown_maximal(&self) -> f64 {
        statistics::drawdown_maximal(&self.equity)
    }

    #[must_use]
    pub fn drawdown_relative(&self) -> f64 {
        statistics::drawdown_relative(&self.equity)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
