//! Table-driven trigonometry and a fast inverse square root.
//!
//! Optimisation sweeps score millions of result sequences, so the circle
//! centroid uses a quarter-wave lookup table instead of `sin`/`cos`. The table
//! is an owned value built on first use; callers create one and pass it by
//! reference.

use std::cell::OnceCell;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Number of entries in the quarter-wave table.
pub const SIN_COS_TABLE_SIZE: usize = 1024;

const MAX_INDEX: usize = SIN_COS_TABLE_SIZE - 1;

/// Fast approximation of `1 / sqrt(x)` with one Newton step.
#[must_use]
pub fn fast_inv_sqrt(x: f32) -> f32 {
    let half = 0.5 * x;
    let y = f32::from_bits(0x5f37_59df_u32.wrapping_sub(x.to_bits() >> 1));
    y * (1.5 - half * y * y)
}

#[derive(Debug)]
struct Quadrant {
    sin: Vec<f32>,
    cos: Vec<f32>,
}

/// Lazily built sine/cosine lookup over the first quadrant.
#[derive(Debug, Default)]
pub struct SinCosTable {
    table: OnceCell<Quadrant>,
}

impl SinCosTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn quadrant(&self) -> &Quadrant {
        self.table.get_or_init(|| {
            let angle = |i: usize| FRAC_PI_2 * i as f64 / MAX_INDEX as f64;
            Quadrant {
                sin: (0..SIN_COS_TABLE_SIZE).map(|i| angle(i).sin() as f32).collect(),
                cos: (0..SIN_COS_TABLE_SIZE).map(|i| angle(i).cos() as f32).collect(),
            }
        })
    }

    /// True once the table has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.table.get().is_some()
    }

    /// Returns `(sin, cos)` of `angle` radians, any sign or magnitude.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sin_cos(&self, angle: f32) -> (f32, f32) {
        let q = self.quadrant();
        let angle = f64::from(angle).rem_euclid(TAU);
        let step = FRAC_PI_2 / MAX_INDEX as f64;
        // offset into the quadrant is in [0, PI/2], so the index is in range
        let index = |offset: f64| ((offset / step + 0.5) as usize).min(MAX_INDEX);

        if angle <= FRAC_PI_2 {
            let i = index(angle);
            (q.sin[i], q.cos[i])
        } else if angle <= PI {
            let i = index(PI - angle);
            (q.sin[i], -q.cos[i])
        } else if angle <= PI + FRAC_PI_2 {
            let i = index(angle - PI);
            (-q.sin[i], -q.cos[i])
        } else {
            let i = index(TAU - angle);
            (-q.sin[i], q.cos[i])
        }
    }

    #[must_use]
    pub fn sin(&self, angle: f32) -> f32 {
        self.sin_cos(angle).0
    }

    #[must_use]
    pub fn cos(&self, angle: f32) -> f32 {
        self.sin_cos(angle).1
    }
}
