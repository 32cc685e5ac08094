//! Performance statistics over a value curve.
//!
//! Every function takes an ordered slice of account values whose first element
//! is the pre-trading baseline. Curves shorter than two points yield 0, and
//! degenerate inputs map to finite sentinels (`T::max_value()` /
//! `T::min_value()`) instead of infinities or NaN, so results stay comparable
//! when ranking strategies.
//!
//! The functions are generic over [`num_traits::Float`] so the same formulas
//! serve `f32` optimisation sweeps and `f64` reporting.

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Maps NaN to zero and infinities to the finite extrema of `T`.
fn finite_or_sentinel<T: Float>(value: T) -> T {
    if value.is_nan() {
        T::zero()
    } else if value == T::infinity() {
        T::max_value()
    } else if value == T::neg_infinity() {
        T::min_value()
    } else {
        value
    }
}

fn from_usize<T: Float>(n: usize) -> T {
    T::from(n).unwrap_or_else(T::max_value)
}

/// Simple return of one step; zero when the previous value is not positive.
fn step_return<T: Float>(prev: T, next: T) -> T {
    if prev > T::zero() {
        (next - prev) / prev
    } else {
        T::zero()
    }
}

/// Geometric average return per step.
///
/// Product of `1 + r[i]` over all steps, raised to `1/(n-1)`, minus 1. A step
/// whose previous value is not positive contributes a zero factor.
#[must_use]
pub fn geometric_average_return<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    let product = curve.windows(2).fold(T::one(), |acc, w| {
        let factor = if w[0] > T::zero() {
            (T::one() + step_return(w[0], w[1])).max(T::zero())
        } else {
            T::zero()
        };
        acc * factor
    });
    let steps: T = from_usize(curve.len() - 1);
    finite_or_sentinel(product.powf(T::one() / steps) - T::one())
}

/// Sharpe ratio of a curve.
///
/// The mean is [`geometric_average_return`]; the variance is taken over the
/// simple per-step returns around that mean. Returns 0 when the mean is 0 and
/// the finite extrema of `T` when the returns do not vary.
#[must_use]
pub fn sharpe_ratio<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    let mean = geometric_average_return(curve);
    if mean == T::zero() {
        return T::zero();
    }

    let sum = curve.windows(2).fold(T::zero(), |acc, w| {
        let diff = step_return(w[0], w[1]) - mean;
        acc + diff * diff
    });

    // element 0 is the baseline, so there are len-1 returns and len-2 degrees of freedom
    let dof: T = from_usize((curve.len() - 2).max(1));
    let stdev = (sum / dof).sqrt();
    if stdev <= mean.abs() * T::epsilon().sqrt() {
        return if mean > T::zero() {
            T::max_value()
        } else {
            T::min_value()
        };
    }
    finite_or_sentinel(mean / stdev)
}

/// Drop from the baseline to the lowest value, never negative.
#[must_use]
pub fn drawdown_absolute<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    let min = curve.iter().copied().fold(T::infinity(), T::min);
    finite_or_sentinel((curve[0] - min).max(T::zero()))
}

/// Largest drop from a running peak to a later trough, in value units.
#[must_use]
pub fn drawdown_maximal<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    let mut peak = curve[0];
    let mut max_drop = T::zero();
    for &value in curve {
        peak = peak.max(value);
        max_drop = max_drop.max(peak - value);
    }
    finite_or_sentinel(max_drop)
}

/// Largest drop from a running peak as a fraction of that peak.
///
/// Peaks that are not positive are skipped.
#[must_use]
pub fn drawdown_relative<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    let mut peak = curve[0];
    let mut max_drop = T::zero();
    for &value in curve {
        peak = peak.max(value);
        if peak > T::zero() {
            max_drop = max_drop.max((peak - value) / peak);
        }
    }
    finite_or_sentinel(max_drop)
}

/// Gross profit over gross loss; `T::max_value()` when nothing was lost.
#[must_use]
pub fn profit_factor<T: Float>(gross_profit: T, gross_loss: T) -> T {
    if gross_loss == T::zero() {
        return T::max_value();
    }
    finite_or_sentinel(gross_profit / gross_loss)
}

/// Mean squared deviation of the log-curve from the straight line joining its ends.
///
/// Zero means the curve grew perfectly exponentially, which is what a
/// fixed-fraction staking plan produces. Curves with non-positive values
/// return `T::max_value()`.
#[must_use]
pub fn profit_stability<T: Float>(curve: &[T]) -> T {
    if curve.len() < 2 {
        return T::zero();
    }
    if curve.iter().any(|v| *v <= T::zero()) {
        return T::max_value();
    }
    let steps: T = from_usize(curve.len() - 1);
    let start = curve[0].ln();
    let delta = (curve[curve.len() - 1].ln() - start) / steps;
    let sum = curve
        .iter()
        .enumerate()
        .skip(1)
        .fold(T::zero(), |acc, (i, v)| {
            let ideal = start + delta * from_usize::<T>(i);
            let diff = v.ln() - ideal;
            acc + diff * diff
        });
    finite_or_sentinel(sum / steps)
}

/// Win/loss counts and gross figures derived from a curve's step deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatisticsSnapshot<T> {
    pub wins: usize,
    pub losses: usize,
    pub gross_profit: T,
    pub gross_loss: T,
}

impl<T: Float> StatisticsSnapshot<T> {
    /// Derives a snapshot from a curve: rising steps count as wins, falling steps as losses.
    #[must_use]
    pub fn from_curve(curve: &[T]) -> Self {
        let mut snapshot = Self {
            wins: 0,
            losses: 0,
            gross_profit: T::zero(),
            gross_loss: T::zero(),
        };
        for w in curve.windows(2) {
            let delta = w[1] - w[0];
            if delta > T::zero() {
                snapshot.wins += 1;
                snapshot.gross_profit = snapshot.gross_profit + delta;
            } else if delta < T::zero() {
                snapshot.losses += 1;
                snapshot.gross_loss = snapshot.gross_loss - delta;
            }
        }
        snapshot
    }

    /// Gross profit minus gross loss.
    #[must_use]
    pub fn net_profit(&self) -> T {
        self.gross_profit - self.gross_loss
    }

    /// See [`profit_factor`].
    #[must_use]
    pub fn profit_factor(&self) -> T {
        profit_factor(self.gross_profit, self.gross_loss)
    }

    /// Wins over definite outcomes; 0 with no outcomes.
    #[must_use]
    pub fn win_rate(&self) -> T {
        let total = self.wins + self.losses;
        if total == 0 {
            return T::zero();
        }
        from_usize::<T>(self.wins) / from_usize::<T>(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Degenerate Inputs
    // ============================================================

    #[test]
    fn test_short_curves_yield_zero() {
        let empty: [f64; 0] = [];
        let single = [1000.0_f64];
        for curve in [&empty[..], &single[..]] {
            assert_eq!(geometric_average_return(curve), 0.0);
            assert_eq!(sharpe_ratio(curve), 0.0);
            assert_eq!(drawdown_absolute(curve), 0.0);
            assert_eq!(drawdown_maximal(curve), 0.0);
            assert_eq!(drawdown_relative(curve), 0.0);
            assert_eq!(profit_stability(curve), 0.0);
        }
    }

    #[test]
    fn test_constant_curve_sharpe_is_zero() {
        let curve = [1000.0_f64; 10];
        assert_eq!(sharpe_ratio(&curve), 0.0);
    }

    #[test]
    fn test_geometric_growth_sharpe_is_positive_sentinel() {
        let curve: Vec<f64> = (0..20).map(|i| 100.0 * 1.1_f64.powi(i)).collect();
        assert_eq!(sharpe_ratio(&curve), f64::MAX);
    }

    #[test]
    fn test_geometric_decline_sharpe_is_negative_sentinel() {
        let curve: Vec<f64> = (0..20).map(|i| 100.0 * 0.9_f64.powi(i)).collect();
        assert_eq!(sharpe_ratio(&curve), f64::MIN);
    }

    #[test]
    fn test_two_point_curve_is_finite() {
        let curve = [100.0_f64, 120.0];
        let s = sharpe_ratio(&curve);
        assert!(s.is_finite());
        assert_eq!(s, f64::MAX);
        assert!((geometric_average_return(&curve) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_curve_through_zero_stays_finite() {
        let curve = [100.0_f64, 0.0, 50.0, -10.0];
        assert!(geometric_average_return(&curve).is_finite());
        assert!(sharpe_ratio(&curve).is_finite());
        assert!(drawdown_relative(&curve).is_finite());
    }

    // ============================================================
    // Returns and Sharpe
    // ============================================================

    #[test]
    fn test_geometric_average_return() {
        // 100 -> 110 -> 99: factors 1.1 and 0.9, product 0.99
        let curve = [100.0_f64, 110.0, 99.0];
        let expected = 0.99_f64.sqrt() - 1.0;
        assert!((geometric_average_return(&curve) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_ratio_mixed_curve() {
        let curve = [100.0_f64, 110.0, 104.5, 114.95];
        let mean = geometric_average_return(&curve);
        let returns = [0.1, -0.05, 0.1];
        let sum: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();
        let expected = mean / (sum / 2.0).sqrt();
        assert!((sharpe_ratio(&curve) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_f32_and_f64_agree() {
        let curve64 = [1000.0_f64, 1010.0, 995.0, 1030.0, 1025.0, 1060.0];
        let curve32: Vec<f32> = curve64.iter().map(|v| *v as f32).collect();
        let s64 = sharpe_ratio(&curve64);
        let s32 = sharpe_ratio(&curve32);
        assert!((s64 - f64::from(s32)).abs() < 1e-3);
        let d64 = drawdown_relative(&curve64);
        let d32 = drawdown_relative(&curve32);
        assert!((d64 - f64::from(d32)).abs() < 1e-5);
    }

    // ============================================================
    // Drawdowns
    // ============================================================

    #[test]
    fn test_drawdowns() {
        let curve = [100.0_f64, 120.0, 90.0, 130.0, 95.0, 140.0];
        assert!((drawdown_absolute(&curve) - 10.0).abs() < f64::EPSILON);
        assert!((drawdown_maximal(&curve) - 35.0).abs() < f64::EPSILON);
        // 120 -> 90 is 25%, 130 -> 95 is ~26.9%
        assert!((drawdown_relative(&curve) - 35.0 / 130.0).abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_absolute_never_negative() {
        let curve = [100.0_f64, 110.0, 120.0];
        assert_eq!(drawdown_absolute(&curve), 0.0);
        assert_eq!(drawdown_maximal(&curve), 0.0);
    }

    // ============================================================
    // Profit Factor and Snapshot
    // ============================================================

    #[test]
    fn test_profit_factor_sentinel() {
        assert_eq!(profit_factor(50.0_f64, 0.0), f64::MAX);
        assert!((profit_factor(50.0_f64, 25.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_from_curve() {
        let curve = [100.0_f64, 110.0, 100.0, 100.0, 108.0];
        let snap = StatisticsSnapshot::from_curve(&curve);
        assert_eq!(snap.wins, 2);
        assert_eq!(snap.losses, 1);
        assert!((snap.gross_profit - 18.0).abs() < f64::EPSILON);
        assert!((snap.gross_loss - 10.0).abs() < f64::EPSILON);
        assert!((snap.net_profit() - 8.0).abs() < f64::EPSILON);
        assert!((snap.win_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_profit_stability_of_exponential_curve_is_zero() {
        let curve: Vec<f64> = (0..10).map(|i| 100.0 * 1.05_f64.powi(i)).collect();
        assert!(profit_stability(&curve) < 1e-20);
        let bumpy = [100.0_f64, 130.0, 90.0, 140.0];
        assert!(profit_stability(&bumpy) > 0.0);
    }
}
