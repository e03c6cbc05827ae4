use crate::math::stats::StatsHelper;
use crate::prelude::{SampleError, Sampler};
use crate::report::ChannelReport;

/// Center frequencies are snapped to this grid (Hz).
pub const ROUND_TO: u64 = 5_000;

/// An above-threshold run that was closed by the first sample at or below
/// the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedRegion {
    pub enter_freq: u64,
    pub left_freq: u64,
    pub powers: Vec<f64>,
}

impl ClosedRegion {
    pub fn new(enter_freq: u64, left_freq: u64, powers: Vec<f64>) -> Self {
        Self {
            enter_freq,
            left_freq,
            powers,
        }
    }

    /// Raw span between entry and the closing edge.
    pub fn raw_bandwidth(&self) -> u64 {
        self.left_freq.saturating_sub(self.enter_freq)
    }

    pub fn center_freq(&self) -> u64 {
        let raw = self.enter_freq as f64 + self.raw_bandwidth() as f64 / 2.0;
        StatsHelper::snap_to_grid(raw, ROUND_TO)
    }

    /// Re-samples the rounded center and estimates the occupied bandwidth
    /// from the collected samples at or above the half-power cutoff.
    pub fn measure(&self, sampler: &dyn Sampler, step: u64) -> Result<ChannelReport, SampleError> {
        let center_freq = self.center_freq();
        let center_power = sampler.pwr(center_freq)?;
        let cutoff = StatsHelper::half_power_cutoff(center_power);
        let retained = StatsHelper::count_at_or_above(&self.powers, cutoff) as u64;
        Ok(ChannelReport::new(center_freq, retained * step, center_power))
    }
}
