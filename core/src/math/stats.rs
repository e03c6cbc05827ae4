pub struct StatsHelper;

impl StatsHelper {
    /// Snaps `value` to the nearest multiple of `grid`, ties to even.
    pub fn snap_to_grid(value: f64, grid: u64) -> u64 {
        let grid = grid.max(1) as f64;
        let snapped = (value / grid).round_ties_even() * grid;
        if snapped <= 0.0 {
            0
        } else {
            snapped as u64
        }
    }

    /// Half-power cutoff taken as a linear half of the absolute level.
    pub fn half_power_cutoff(center_power: f64) -> f64 {
        center_power - (center_power / 2.0).abs()
    }

    pub fn count_at_or_above(samples: &[f64], cutoff: f64) -> usize {
        samples.iter().filter(|&&power| power >= cutoff).count()
    }
}
