use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse across tuning windows.
pub struct FftHelper {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Forward transform of an IQ block, zero-padded or truncated to `size`.
    pub fn forward(&self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Complex32::zero());
        self.fft.process(&mut buffer);
        buffer
    }

    /// Per-bin power in dB, normalised so a unit tone on a bin reads 0 dB.
    /// Bins are returned in ascending frequency order (DC in the middle).
    pub fn power_db_shifted(&self, input: &[Complex32]) -> Vec<f64> {
        let spectrum = self.forward(input);
        let norm = (self.size * self.size) as f64;
        let half = self.size / 2;
        spectrum[half..]
            .iter()
            .chain(spectrum[..half].iter())
            .map(|bin| {
                let power = bin.norm_sqr() as f64 / norm;
                10.0 * power.max(1e-20).log10()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn fft_helper_returns_same_length() {
        let helper = FftHelper::new(4);
        let input = [
            Complex32::new(1.0, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(-1.0, 0.0),
        ];
        assert_eq!(helper.forward(&input).len(), 4);
    }

    #[test]
    fn bin_aligned_tone_lands_on_its_bin() {
        let size = 16;
        let helper = FftHelper::new(size);
        let tone: Vec<Complex32> = (0..size)
            .map(|n| Complex32::from_polar(1.0, 2.0 * PI * 3.0 * n as f32 / size as f32))
            .collect();
        let power = helper.power_db_shifted(&tone);
        // bin +3 sits at index half + 3 after the shift
        assert!(power[size / 2 + 3].abs() < 0.01);
        assert!(power[size / 2] < -100.0);
    }
}
