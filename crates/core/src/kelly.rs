//! Kelly criterion and expectation math for fixed-payout binary options.
//!
//! A binary option pays `payout` per unit staked on a win and loses the stake
//! (`loss`, normally 1.0) otherwise. For win probability `p`:
//! ```text
//! EV      = p * payout - (1 - p) * loss
//! p_min   = loss / (payout + loss)
//! f*      = ((payout + 1) * p - 1) / payout
//! ```
//! The staked fraction is `attenuation * f*`; full Kelly is too aggressive
//! when `p` is only an estimate.

use num_traits::Float;

use crate::error::{Result, WagerError};

/// Default Kelly attenuation factor.
pub const DEFAULT_ATTENUATION: f64 = 0.4;

fn constant<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::zero)
}

/// Expected profit per unit staked.
///
/// # Arguments
/// * `win_rate` - Probability of winning (0 to 1)
/// * `payout` - Broker payout on a win, per unit staked
/// * `loss` - Loss on a losing wager, per unit staked
///
/// # Returns
/// The expectation, or 0 when `win_rate` is outside `[0, 1]`.
#[must_use]
pub fn expected_payoff<T: Float>(win_rate: T, payout: T, loss: T) -> T {
    if win_rate < T::zero() || win_rate > T::one() {
        return T::zero();
    }
    win_rate * payout - (T::one() - win_rate) * loss
}

/// Like [`expected_payoff`] but rejects an out-of-range probability.
///
/// # Errors
/// Returns `InvalidParameter` if `win_rate` is outside `[0, 1]` or not finite.
pub fn checked_expected_payoff<T: Float>(win_rate: T, payout: T, loss: T) -> Result<T> {
    if !(win_rate >= T::zero() && win_rate <= T::one()) {
        return Err(WagerError::InvalidParameter(format!(
            "win rate {:?} outside [0, 1]",
            win_rate.to_f64()
        )));
    }
    Ok(expected_payoff(win_rate, payout, loss))
}

/// Break-even win rate for the given payout.
#[must_use]
pub fn min_win_rate<T: Float>(payout: T, loss: T) -> T {
    loss / (payout + loss)
}

/// Attenuated Kelly fraction of the balance to stake.
///
/// Returns 0 when `win_rate` does not beat [`min_win_rate`] for a unit loss.
#[must_use]
pub fn kelly_fraction<T: Float>(win_rate: T, payout: T, attenuation: T) -> T {
    if payout <= T::zero() || win_rate <= min_win_rate(payout, T::one()) {
        return T::zero();
    }
    attenuation * (((payout + T::one()) * win_rate - T::one()) / payout)
}

/// [`kelly_fraction`] with [`DEFAULT_ATTENUATION`].
#[must_use]
pub fn default_kelly_fraction<T: Float>(win_rate: T, payout: T) -> T {
    kelly_fraction(win_rate, payout, constant(DEFAULT_ATTENUATION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_payoff() {
        // 60% at 80% payout: 0.6*0.8 - 0.4 = 0.08
        assert!((expected_payoff(0.6_f64, 0.8, 1.0) - 0.08).abs() < 1e-12);
        assert_eq!(expected_payoff(1.5_f64, 0.8, 1.0), 0.0);
        assert_eq!(expected_payoff(-0.1_f64, 0.8, 1.0), 0.0);
    }

    #[test]
    fn test_checked_expected_payoff_rejects_out_of_range() {
        assert!(checked_expected_payoff(0.5_f64, 0.8, 1.0).is_ok());
        let err = checked_expected_payoff(1.2_f64, 0.8, 1.0).unwrap_err();
        assert!(matches!(err, WagerError::InvalidParameter(_)));
        assert!(checked_expected_payoff(f64::NAN, 0.8, 1.0).is_err());
    }

    #[test]
    fn test_min_win_rate() {
        assert!((min_win_rate(0.8_f64, 1.0) - 1.0 / 1.8).abs() < 1e-12);
        assert!((min_win_rate(1.0_f64, 1.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kelly_fraction_below_break_even_is_zero() {
        assert_eq!(kelly_fraction(0.55_f64, 0.8, 0.4), 0.0);
        assert_eq!(kelly_fraction(0.5_f64, 1.0, 0.4), 0.0);
    }

    #[test]
    fn test_kelly_fraction_positive_edge() {
        // ((1.8 * 0.6) - 1) / 0.8 = 0.1, attenuated by 0.4
        let f = kelly_fraction(0.6_f64, 0.8, 0.4);
        assert!((f - 0.04).abs() < 1e-12);
        assert!((default_kelly_fraction(0.6_f64, 0.8) - f).abs() < 1e-12);
    }

    #[test]
    fn test_kelly_fraction_f32() {
        let f = kelly_fraction(0.6_f32, 0.8, 0.4);
        assert!((f - 0.04).abs() < 1e-6);
    }
}
