use serde::{Deserialize, Serialize};

/// One point of a [`Curve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub value: f64,
    pub timestamp: i64,
}

/// Append-only account value series. Point 0 is the pre-trading baseline.
///
/// Timestamps never decrease: a point stamped before the previous one is
/// moved up to it. Values and timestamps are kept in parallel so the value series can be
/// handed to the statistics functions as a slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    values: Vec<f64>,
    timestamps: Vec<i64>,
}

impl Curve {
    /// Creates a curve holding only its baseline.
    #[must_use]
    pub fn new(baseline: f64, timestamp: i64) -> Self {
        Self {
            values: vec![baseline],
            timestamps: vec![timestamp],
        }
    }

    pub(crate) fn push(&mut self, value: f64, timestamp: i64) {
        let timestamp = timestamp.max(self.last_timestamp());
        self.values.push(value);
        self.timestamps.push(timestamp);
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    #[must_use]
    pub fn baseline(&self) -> f64 {
        self.values[0]
    }

    /// Most recent value.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    #[must_use]
    pub fn last_timestamp(&self) -> i64 {
        self.timestamps[self.timestamps.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a curve holds at least its baseline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = CurvePoint> + '_ {
        self.values
            .iter()
            .zip(&self.timestamps)
            .map(|(&value, &timestamp)| CurvePoint { value, timestamp })
    }
}
