//! Scoring functions for ranking strategy parameter sets.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::trig::{fast_inv_sqrt, SinCosTable};

/// How wins and losses are weighted when wrapped around the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentroidMode {
    /// Only wins carry mass.
    WinsOnly,
    /// Wins carry positive mass, losses negative mass.
    WinsAndLosses,
}

/// Distance between the centre of a circle and the centre of mass of a result
/// sequence wrapped around it.
///
/// Each outcome is placed at an equal angular step over `revolutions` turns.
/// Evenly spread wins give 0 (best); wins bunched together approach 1 (worst).
/// Several revolutions dampen periodic clustering.
///
/// # Arguments
/// * `outcomes` - `true` for a win, `false` for a loss
/// * `revolutions` - Turns around the circle, at least 1
/// * `mode` - Whether losses subtract mass
/// * `table` - Lookup table used for the angles
#[must_use]
pub fn centroid_circle(
    outcomes: &[bool],
    revolutions: u32,
    mode: CentroidMode,
    table: &SinCosTable,
) -> f32 {
    let weights = outcomes.iter().map(|&win| if win { 1.0 } else { -1.0 });
    centroid(weights, outcomes.len(), revolutions, mode, table)
}

/// Weighted variant of [`centroid_circle`] where each element is a profit.
#[must_use]
pub fn centroid_circle_weighted(profits: &[f32], revolutions: u32, table: &SinCosTable) -> f32 {
    let count = profits.iter().filter(|p| **p != 0.0).count();
    let mut sum_x = 0.0_f32;
    let mut sum_y = 0.0_f32;
    for (angle, profit) in angles(profits.len(), revolutions).zip(profits) {
        if *profit == 0.0 {
            continue;
        }
        let (s, c) = table.sin_cos(angle);
        sum_x += profit * c;
        sum_y += profit * s;
    }
    magnitude(sum_x, sum_y, count)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn angles(len: usize, revolutions: u32) -> impl Iterator<Item = f32> {
    let step = if len == 0 {
        0.0
    } else {
        (TAU * f64::from(revolutions.max(1)) / len as f64) as f32
    };
    (0..len).map(move |i| step * i as f32)
}

fn centroid(
    weights: impl Iterator<Item = f32>,
    len: usize,
    revolutions: u32,
    mode: CentroidMode,
    table: &SinCosTable,
) -> f32 {
    let mut sum_x = 0.0_f32;
    let mut sum_y = 0.0_f32;
    let mut count = 0_usize;
    for (angle, weight) in angles(len, revolutions).zip(weights) {
        if mode == CentroidMode::WinsOnly && weight < 0.0 {
            continue;
        }
        count += 1;
        let (s, c) = table.sin_cos(angle);
        sum_x += weight * c;
        sum_y += weight * s;
    }
    magnitude(sum_x, sum_y, count)
}

fn magnitude(sum_x: f32, sum_y: f32, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f32;
    let (cx, cy) = (sum_x / n, sum_y / n);
    let squared = cx * cx + cy * cy;
    if squared == 0.0 {
        return 0.0;
    }
    1.0 / fast_inv_sqrt(squared)
}

/// Axis adjustments for [`coeff_best_3d`]. The defaults weigh all axes equally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Best3dWeights {
    pub win_rate_scale: f32,
    pub win_rate_gain: f32,
    pub stability_gain: f32,
    pub stability_offset: f32,
    pub deals_scale: f32,
    pub deals_gain: f32,
}

impl Default for Best3dWeights {
    fn default() -> Self {
        Self {
            win_rate_scale: 1.0,
            win_rate_gain: 1.0,
            stability_gain: 1.0,
            stability_offset: 0.0,
            deals_scale: 1.0,
            deals_gain: 1.0,
        }
    }
}

/// Distance from a strategy to the ideal point in (inverse win rate,
/// stability, inverse deal count) space. Lower is better.
#[must_use]
pub fn coeff_best_3d(
    win_rate: f32,
    stability: f32,
    deals: f32,
    max_deals: f32,
    weights: &Best3dWeights,
) -> f32 {
    let inv_win_rate = weights.win_rate_scale * (1.0 - win_rate * weights.win_rate_gain);
    let stability = stability * weights.stability_gain + weights.stability_offset;
    let relative_deals = if max_deals > 0.0 {
        weights.deals_scale * (1.0 - (deals / max_deals) * weights.deals_gain)
    } else {
        weights.deals_scale
    };
    let squared =
        inv_win_rate * inv_win_rate + relative_deals * relative_deals + stability * stability;
    if squared == 0.0 {
        return 0.0;
    }
    1.0 / fast_inv_sqrt(squared)
}
