use std::fmt;
use std::ops::Sub;

/// Innings pitched, stored as outs recorded.
///
/// Box scores write innings in thirds notation, where `5.1` means five innings and one out.
/// That figure is not a number of innings; use [`InningsPitched::true_innings`] for rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InningsPitched(u32);

impl InningsPitched {
    pub const fn from_outs(outs: u32) -> Self {
        Self(outs)
    }

    pub const fn from_whole_innings(innings: u32) -> Self {
        Self(innings * 3)
    }

    pub const fn outs(self) -> u32 {
        self.0
    }

    /// `5.1` for sixteen outs.
    pub fn thirds_notation(self) -> f64 {
        f64::from((self.0 / 3) * 10 + self.0 % 3) / 10.0
    }

    pub fn true_innings(self) -> f64 {
        f64::from(self.0) / 3.0
    }

    /// Earned runs per nine innings; `None` when no outs were recorded.
    pub fn era(self, earned_runs: u32) -> Option<f64> {
        (self.0 > 0).then(|| 9.0 * f64::from(earned_runs) / self.true_innings())
    }

    pub fn whip(self, hits: u32, walks: u32) -> Option<f64> {
        (self.0 > 0).then(|| f64::from(hits + walks) / self.true_innings())
    }
}

impl Sub for InningsPitched {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for InningsPitched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 3, self.0 % 3)
    }
}
