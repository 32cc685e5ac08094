//! Deterministic settlement of binary-option wagers.
//!
//! The engine keeps open wagers in a queue ordered by close time and only
//! resolves them when the caller moves the simulated clock. Every batch of
//! wagers sharing one close timestamp is settled together and produces
//! exactly one balance point and one equity point.
//!
//! # Example
//!
//! ```
//! use binopt_backtest::SettlementEngine;
//! use binopt_core::WagerResult;
//!
//! let mut engine = SettlementEngine::new(1000.0).with_start_time(0);
//! engine.add_wager(WagerResult::Win, 60, 0.8, 10.0, Some(0)).unwrap();
//! engine.advance(60);
//! assert!((engine.balance() - 1008.0).abs() < 1e-9);
//! ```

use binopt_core::{kelly, statistics, EngineConfig, Result, StatisticsSnapshot, WagerError, WagerResult};
use std::collections::VecDeque;
use tracing::debug;

use crate::curve::Curve;
use crate::report::{CurveKind, PerformanceReport};

/// A wager awaiting expiry.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSettlement {
    open: i64,
    close: i64,
    stake: f64,
    payoff: f64,
    result: WagerResult,
}

/// Balance/equity simulator for fixed-payout wagers.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    balance: f64,
    start_balance: f64,
    start_timestamp: i64,
    payout: f64,
    stake: f64,
    clock: i64,
    pending: VecDeque<PendingSettlement>,
    balance_curve: Curve,
    equity_curve: Curve,
    wins: u64,
    losses: u64,
    neutrals: u64,
    gross_profit: f64,
    gross_loss: f64,
}

impl SettlementEngine {
    /// Creates an engine with `start_balance` and the clock at 0.
    ///
    /// Default payout and stake come from [`EngineConfig::default`].
    #[must_use]
    pub fn new(start_balance: f64) -> Self {
        let defaults = EngineConfig::default();
        Self {
            balance: start_balance,
            start_balance,
            start_timestamp: 0,
            payout: defaults.payout,
            stake: defaults.stake,
            clock: 0,
            pending: VecDeque::new(),
            balance_curve: Curve::new(start_balance, 0),
            equity_curve: Curve::new(start_balance, 0),
            wins: 0,
            losses: 0,
            neutrals: 0,
            gross_profit: 0.0,
            gross_loss: 0.0,
        }
    }

    /// Starts the clock, and the curve baselines, at `timestamp`.
    #[must_use]
    pub fn with_start_time(mut self, timestamp: i64) -> Self {
        self.start_timestamp = timestamp;
        self.reset();
        self
    }

    /// Sets the payout and stake used by [`add_default_wager`](Self::add_default_wager).
    #[must_use]
    pub fn with_wager_defaults(mut self, payout: f64, stake: f64) -> Self {
        self.payout = payout;
        self.stake = stake;
        self
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.start_balance)
            .with_start_time(config.start_timestamp)
            .with_wager_defaults(config.payout, config.stake)
    }

    /// Discards all wagers and statistics and returns to the starting state.
    pub fn reset(&mut self) {
        self.balance = self.start_balance;
        self.clock = self.start_timestamp;
        self.pending.clear();
        self.balance_curve = Curve::new(self.start_balance, self.start_timestamp);
        self.equity_curve = Curve::new(self.start_balance, self.start_timestamp);
        self.wins = 0;
        self.losses = 0;
        self.neutrals = 0;
        self.gross_profit = 0.0;
        self.gross_loss = 0.0;
    }

    /// Opens a wager.
    ///
    /// The stake is deducted from the balance immediately and the wager is
    /// queued by close time (`open + duration`), after any wagers closing at
    /// the same instant. A wager that is already past its close time waits
    /// for the next clock move, and its curve points are stamped no earlier
    /// than the previous point.
    ///
    /// # Arguments
    /// * `result` - How the wager will settle
    /// * `duration` - Seconds until expiry
    /// * `payout` - Profit per unit staked on a win
    /// * `stake` - Absolute amount when >= 1.0, otherwise a fraction of the balance
    /// * `open` - Open time; the simulated clock when `None`
    ///
    /// # Returns
    /// `false` without touching anything when the balance is not positive.
    /// An absolute stake larger than the balance is still accepted and can
    /// drive the balance below zero.
    ///
    /// # Errors
    /// `InvalidParameter` if `payout` is negative or not finite, or `stake`
    /// is not positive and finite.
    pub fn add_wager(
        &mut self,
        result: WagerResult,
        duration: u32,
        payout: f64,
        stake: f64,
        open: Option<i64>,
    ) -> Result<bool> {
        if !payout.is_finite() || payout < 0.0 {
            return Err(WagerError::InvalidParameter(format!("payout {payout}")));
        }
        if !stake.is_finite() || stake <= 0.0 {
            return Err(WagerError::InvalidParameter(format!("stake {stake}")));
        }
        if self.balance <= 0.0 {
            debug!(balance = self.balance, "Balance exhausted, wager refused");
            return Ok(false);
        }

        let open = open.unwrap_or(self.clock);
        let close = open.saturating_add(i64::from(duration));
        let committed = if stake < 1.0 { self.balance * stake } else { stake };
        self.balance -= committed;

        let position = self.pending.partition_point(|p| p.close <= close);
        self.pending.insert(
            position,
            PendingSettlement {
                open,
                close,
                stake: committed,
                payoff: committed * payout,
                result,
            },
        );
        Ok(true)
    }

    /// Opens a wager with the engine's default payout and stake.
    ///
    /// # Errors
    /// Same as [`add_wager`](Self::add_wager).
    pub fn add_default_wager(
        &mut self,
        result: WagerResult,
        duration: u32,
        open: Option<i64>,
    ) -> Result<bool> {
        self.add_wager(result, duration, self.payout, self.stake, open)
    }

    /// Moves the clock to `timestamp` (never backwards) and settles everything due.
    ///
    /// # Returns
    /// Number of wagers settled.
    pub fn advance(&mut self, timestamp: i64) -> usize {
        self.clock = self.clock.max(timestamp);
        self.settle_until(self.clock)
    }

    /// Moves the clock forward by `seconds`.
    pub fn tick(&mut self, seconds: u32) -> usize {
        self.advance(self.clock.saturating_add(i64::from(seconds)))
    }

    /// Settles every outstanding wager. The clock does not move.
    pub fn stop(&mut self) -> usize {
        self.settle_until(i64::MAX)
    }

    fn settle_until(&mut self, limit: i64) -> usize {
        let mut settled = 0;
        while let Some(close) = self.pending.front().map(|p| p.close) {
            if close > limit {
                break;
            }
            let mut equity_delta = 0.0;
            let mut batch = 0_usize;
            while let Some(wager) = self.pending.front().copied() {
                if wager.close != close {
                    break;
                }
                self.pending.pop_front();
                equity_delta += self.settle_one(&wager);
                batch += 1;
            }
            self.balance_curve.push(self.balance, close);
            let equity = self.equity_curve.last() + equity_delta;
            self.equity_curve.push(equity, close);
            debug!(close, batch, balance = self.balance, equity, "Settled batch");
            settled += batch;
        }
        settled
    }

    /// Applies one settlement and returns its equity change.
    fn settle_one(&mut self, wager: &PendingSettlement) -> f64 {
        match wager.result {
            WagerResult::Win => {
                self.wins += 1;
                self.balance += wager.payoff + wager.stake;
                self.gross_profit += wager.payoff;
                wager.payoff
            }
            WagerResult::Loss => {
                self.losses += 1;
                self.gross_loss += wager.stake;
                -wager.stake
            }
            WagerResult::Neutral => {
                self.neutrals += 1;
                self.balance += wager.stake;
                0.0
            }
        }
    }

    #[must_use]
    pub fn balance(&self) -> f64 {
        self.balance
    }

    #[must_use]
    pub fn start_balance(&self) -> f64 {
        self.start_balance
    }

    /// Payout used by [`add_default_wager`](Self::add_default_wager).
    #[must_use]
    pub fn default_payout(&self) -> f64 {
        self.payout
    }

    /// Stake used by [`add_default_wager`](Self::add_default_wager).
    #[must_use]
    pub fn default_stake(&self) -> f64 {
        self.stake
    }

    /// Current simulated time.
    #[must_use]
    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Wagers opened but not yet settled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Open time of the earliest-closing pending wager.
    #[must_use]
    pub fn next_open(&self) -> Option<i64> {
        self.pending.front().map(|p| p.open)
    }

    /// Close time of the earliest-closing pending wager.
    #[must_use]
    pub fn next_close(&self) -> Option<i64> {
        self.pending.front().map(|p| p.close)
    }

    #[must_use]
    pub fn balance_curve(&self) -> &Curve {
        &self.balance_curve
    }

    #[must_use]
    pub fn equity_curve(&self) -> &Curve {
        &self.equity_curve
    }

    #[must_use]
    pub fn curve(&self, kind: CurveKind) -> &Curve {
        match kind {
            CurveKind::Balance => &self.balance_curve,
            CurveKind::Equity => &self.equity_curve,
        }
    }

    #[must_use]
    pub fn wins(&self) -> u64 {
        self.wins
    }

    #[must_use]
    pub fn losses(&self) -> u64 {
        self.losses
    }

    /// Settled wagers that neither won nor lost.
    #[must_use]
    pub fn neutrals(&self) -> u64 {
        self.neutrals
    }

    /// Wins plus losses.
    #[must_use]
    pub fn deals(&self) -> u64 {
        self.wins + self.losses
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self) -> f64 {
        let deals = self.deals();
        if deals == 0 {
            return 0.0;
        }
        self.wins as f64 / deals as f64
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

    /// Gross profit over gross loss; `f64::MAX` with no losses.
    #[must_use]
    pub fn profit_factor(&self) -> f64 {
        statistics::profit_factor(self.gross_profit, self.gross_loss)
    }

    /// Expected profit per unit staked at the observed win rate.
    #[must_use]
    pub fn expected_payoff(&self, payout: f64, loss: f64) -> f64 {
        kelly::expected_payoff(self.win_rate(), payout, loss)
    }

    /// Attenuated Kelly fraction at the observed win rate.
    #[must_use]
    pub fn kelly_fraction(&self, payout: f64, attenuation: f64) -> f64 {
        kelly::kelly_fraction(self.win_rate(), payout, attenuation)
    }

    #[must_use]
    pub fn geometric_average_return(&self, kind: CurveKind) -> f64 {
        statistics::geometric_average_return(self.curve(kind).values())
    }

    #[must_use]
    pub fn sharpe_ratio(&self, kind: CurveKind) -> f64 {
        statistics::sharpe_ratio(self.curve(kind).values())
    }

    #[must_use]
    pub fn drawdown_absolute(&self, kind: CurveKind) -> f64 {
        statistics::drawdown_absolute(self.curve(kind).values())
    }

    #[must_use]
    pub fn drawdown_maximal(&self, kind: CurveKind) -> f64 {
        statistics::drawdown_maximal(self.curve(kind).values())
    }

    #[must_use]
    pub fn drawdown_relative(&self, kind: CurveKind) -> f64 {
        statistics::drawdown_relative(self.curve(kind).values())
    }

    /// Win/loss counts and gross figures read back from a curve.
    #[must_use]
    pub fn snapshot(&self, kind: CurveKind) -> StatisticsSnapshot<f64> {
        StatisticsSnapshot::from_curve(self.curve(kind).values())
    }

    /// Collects every statistic for `kind` into one serialisable report.
    #[must_use]
    pub fn report(&self, kind: CurveKind) -> PerformanceReport {
        let values = self.curve(kind).values();
        PerformanceReport {
            curve: kind,
            start_balance: self.start_balance,
            final_balance: self.balance,
            final_equity: self.equity_curve.last(),
            wins: self.wins,
            losses: self.losses,
            neutrals: self.neutrals,
            win_rate: self.win_rate(),
            gross_profit: self.gross_profit,
            gross_loss: self.gross_loss,
            net_profit: self.net_profit(),
            profit_factor: self.profit_factor(),
            geometric_average_return: statistics::geometric_average_return(values),
            sharpe_ratio: statistics::sharpe_ratio(values),
            drawdown_absolute: statistics::drawdown_absolute(values),
            drawdown_maximal: statistics::drawdown_maximal(values),
            drawdown_relative: statistics::drawdown_relative(values),
            profit_stability: statistics::profit_stability(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYOUT: f64 = 0.8;

    // ============================================================
    // Staking
    // ============================================================

    #[test]
    fn test_absolute_stake_deducted_immediately() {
        let mut engine = SettlementEngine::new(1000.0);
        assert!(engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(0)).unwrap());
        assert!((engine.balance() - 990.0).abs() < 1e-9);
        assert_eq!(engine.pending_count(), 1);
        assert_eq!(engine.balance_curve().len(), 1);
    }

    #[test]
    fn test_fractional_stake_uses_current_balance() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Loss, 60, PAYOUT, 0.1, Some(0)).unwrap();
        engine.add_wager(WagerResult::Loss, 60, PAYOUT, 0.1, Some(0)).unwrap();
        // 1000 - 100 - 90
        assert!((engine.balance() - 810.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut engine = SettlementEngine::new(1000.0);
        for (payout, stake) in [(-0.1, 10.0), (f64::NAN, 10.0), (0.8, 0.0), (0.8, -5.0), (0.8, f64::INFINITY)] {
            let err = engine
                .add_wager(WagerResult::Win, 60, payout, stake, None)
                .unwrap_err();
            assert!(matches!(err, WagerError::InvalidParameter(_)));
        }
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_exhausted_balance_refuses_wagers() {
        let mut engine = SettlementEngine::new(10.0);
        assert!(engine.add_wager(WagerResult::Loss, 60, PAYOUT, 10.0, Some(0)).unwrap());
        assert!(!engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(0)).unwrap());
        assert_eq!(engine.pending_count(), 1);
    }

    #[test]
    fn test_oversized_absolute_stake_goes_negative() {
        let mut engine = SettlementEngine::new(5.0);
        assert!(engine.add_wager(WagerResult::Loss, 60, PAYOUT, 10.0, Some(0)).unwrap());
        engine.stop();
        assert!((engine.balance() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_wager_uses_configured_payout_and_stake() {
        let config = EngineConfig {
            start_balance: 1000.0,
            payout: 0.9,
            stake: 0.05,
            ..EngineConfig::default()
        };
        let mut engine = SettlementEngine::from_config(&config);
        assert!(engine.add_default_wager(WagerResult::Win, 60, Some(0)).unwrap());
        // 5% of 1000 staked
        assert!((engine.balance() - 950.0).abs() < 1e-9);
        engine.stop();
        assert!((engine.balance() - 1045.0).abs() < 1e-9);
        assert!((engine.default_stake() - 0.05).abs() < f64::EPSILON);
    }

    // ============================================================
    // Clock and Batching
    // ============================================================

    #[test]
    fn test_nothing_settles_before_close() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(100)).unwrap();
        assert_eq!(engine.advance(159), 0);
        assert_eq!(engine.pending_count(), 1);
        assert_eq!(engine.advance(160), 1);
        assert!((engine.balance() - 1008.0).abs() < 1e-9);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.advance(500);
        engine.advance(100);
        assert_eq!(engine.clock(), 500);
        engine.tick(30);
        assert_eq!(engine.clock(), 530);
    }

    #[test]
    fn test_default_open_is_clock() {
        let mut engine = SettlementEngine::new(1000.0).with_start_time(1_000);
        engine.tick(20);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, None).unwrap();
        assert_eq!(engine.next_open(), Some(1_020));
        assert_eq!(engine.next_close(), Some(1_080));
    }

    #[test]
    fn test_batch_produces_one_point_per_close_time() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(0)).unwrap();
        engine.add_wager(WagerResult::Loss, 60, PAYOUT, 10.0, Some(0)).unwrap();
        engine.add_wager(WagerResult::Win, 30, PAYOUT, 10.0, Some(30)).unwrap();
        engine.add_wager(WagerResult::Win, 120, PAYOUT, 10.0, Some(0)).unwrap();

        assert_eq!(engine.advance(60), 3);
        let balance = engine.balance_curve();
        let equity = engine.equity_curve();
        assert_eq!(balance.len(), 2);
        assert_eq!(balance.timestamps(), &[0, 60]);
        // 960 after stakes, +18 win, +18 win, loss stays deducted
        assert!((balance.last() - 996.0).abs() < 1e-9);
        assert!((equity.last() - 1006.0).abs() < 1e-9);

        engine.stop();
        assert_eq!(engine.equity_curve().timestamps(), &[0, 60, 120]);
        assert!((engine.balance() - 1014.0).abs() < 1e-9);
        assert!((engine.equity_curve().last() - 1014.0).abs() < 1e-9);
    }

    #[test]
    fn test_late_wager_keeps_curve_timestamps_ordered() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 300, PAYOUT, 10.0, Some(0)).unwrap();
        engine.advance(600);
        // closes at 60, before the point already stamped at 300
        engine.add_wager(WagerResult::Loss, 60, PAYOUT, 10.0, Some(0)).unwrap();
        assert_eq!(engine.advance(600), 1);
        let stamps = engine.equity_curve().timestamps();
        assert_eq!(stamps, &[0, 300, 300]);
        assert_eq!(engine.balance_curve().timestamps(), &[0, 300, 300]);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_stop_does_not_move_clock() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 3_600, PAYOUT, 10.0, Some(0)).unwrap();
        assert_eq!(engine.stop(), 1);
        assert_eq!(engine.clock(), 0);
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_neutral_refunds_stake() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Neutral, 60, PAYOUT, 10.0, Some(0)).unwrap();
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(0)).unwrap();
        engine.stop();
        assert_eq!(engine.neutrals(), 1);
        assert_eq!(engine.deals(), 1);
        assert!((engine.balance() - 1008.0).abs() < 1e-9);
    }

    // ============================================================
    // Statistics
    // ============================================================

    #[test]
    fn test_even_payout_wins_and_losses_cancel() {
        let mut engine = SettlementEngine::new(1000.0);
        for i in 0..40_i64 {
            let result = if i % 2 == 0 { WagerResult::Win } else { WagerResult::Loss };
            engine.add_wager(result, 60, 1.0, 10.0, Some(i * 60)).unwrap();
        }
        engine.stop();
        assert_eq!(engine.wins(), 20);
        assert_eq!(engine.losses(), 20);
        assert!((engine.balance() - 1000.0).abs() < 1e-9);
        assert!((engine.net_profit()).abs() < 1e-9);
        assert!((engine.profit_factor() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_and_snapshot() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 100.0, Some(0)).unwrap();
        engine.add_wager(WagerResult::Loss, 60, PAYOUT, 100.0, Some(60)).unwrap();
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 100.0, Some(120)).unwrap();
        engine.stop();

        let snap = engine.snapshot(CurveKind::Equity);
        assert_eq!(snap.wins, 2);
        assert_eq!(snap.losses, 1);
        assert!((snap.gross_profit - engine.gross_profit()).abs() < 1e-9);
        assert!((snap.gross_loss - engine.gross_loss()).abs() < 1e-9);

        let report = engine.report(CurveKind::Equity);
        assert!((report.final_equity - 1060.0).abs() < 1e-9);
        assert!((report.drawdown_maximal - 100.0).abs() < 1e-9);
        assert!((report.profit_factor - 1.6).abs() < 1e-9);
        assert!((report.win_rate - 2.0 / 3.0).abs() < 1e-12);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"curve\":\"equity\""));
    }

    #[test]
    fn test_profit_factor_without_losses_is_sentinel() {
        let mut engine = SettlementEngine::new(1000.0);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, Some(0)).unwrap();
        engine.stop();
        assert_eq!(engine.profit_factor(), f64::MAX);
    }

    #[test]
    fn test_kelly_and_expectation_from_observed_rate() {
        let mut engine = SettlementEngine::new(1000.0);
        for i in 0..10_i64 {
            let result = if i < 6 { WagerResult::Win } else { WagerResult::Loss };
            engine.add_wager(result, 60, PAYOUT, 10.0, Some(i)).unwrap();
        }
        engine.stop();
        assert!((engine.expected_payoff(PAYOUT, 1.0) - 0.08).abs() < 1e-12);
        assert!((engine.kelly_fraction(PAYOUT, 0.4) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_reset_restores_start_state() {
        let config = EngineConfig {
            start_balance: 500.0,
            start_timestamp: 1_000,
            ..EngineConfig::default()
        };
        let mut engine = SettlementEngine::from_config(&config);
        engine.add_wager(WagerResult::Win, 60, PAYOUT, 10.0, None).unwrap();
        engine.stop();
        engine.reset();
        assert!((engine.default_payout() - config.payout).abs() < f64::EPSILON);
        assert!((engine.balance() - 500.0).abs() < f64::EPSILON);
        assert_eq!(engine.clock(), 1_000);
        assert_eq!(engine.deals(), 0);
        assert_eq!(engine.equity_curve().timestamps(), &[1_000]);
    }
}
