use serde::{Deserialize, Serialize};

use crate::record::WagerResult;

/// Running win/loss tally. Neutral results are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossCounter {
    wins: u32,
    losses: u32,
}

impl WinLossCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: WagerResult) {
        match result {
            WagerResult::Win => self.wins += 1,
            WagerResult::Loss => self.losses += 1,
            WagerResult::Neutral => {}
        }
    }

    #[must_use]
    pub fn wins(&self) -> u32 {
        self.wins
    }

    #[must_use]
    pub fn losses(&self) -> u32 {
        self.losses
    }

    /// Wins plus losses.
    #[must_use]
    pub fn deals(&self) -> u32 {
        self.wins + self.losses
    }

    /// Fraction of definite outcomes that were wins; 0 with no outcomes.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        let deals = self.deals();
        if deals == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(deals)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl FromIterator<WagerResult> for WinLossCounter {
    fn from_iter<I: IntoIterator<Item = WagerResult>>(iter: I) -> Self {
        let mut counter = Self::new();
        for result in iter {
            counter.add(result);
        }
        counter
    }
}
