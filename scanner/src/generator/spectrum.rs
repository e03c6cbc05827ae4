use log::debug;
use num_complex::Complex32;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use sweepcore::math::FftHelper;
use sweepcore::{SampleError, Sampler};

/// A synthetic transmitter occupying a flat band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub center_mhz: f64,
    pub bandwidth_khz: f64,
    pub power_db: f64,
}

impl EmitterConfig {
    fn band_hz(&self) -> (f64, f64) {
        let center = self.center_mhz * 1e6;
        let half = self.bandwidth_khz * 1e3 / 2.0;
        (center - half, center + half)
    }
}

/// Configuration for the virtual spectrum device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub noise_floor_db: f64,
    pub noise_jitter_db: f64,
    pub seed: u64,
    pub fft_size: usize,
    pub bin_hz: u64,
    pub emitters: Vec<EmitterConfig>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            noise_floor_db: -60.0,
            noise_jitter_db: 3.0,
            seed: 0,
            fft_size: 256,
            bin_hz: 5_000,
            emitters: vec![
                EmitterConfig {
                    center_mhz: 101.1,
                    bandwidth_khz: 200.0,
                    power_db: -20.0,
                },
                EmitterConfig {
                    center_mhz: 104.5,
                    bandwidth_khz: 150.0,
                    power_db: -25.0,
                },
                EmitterConfig {
                    center_mhz: 107.9,
                    bandwidth_khz: 100.0,
                    power_db: -15.0,
                },
            ],
        }
    }
}

impl SpectrumConfig {
    fn normalized_fft_size(&self) -> usize {
        self.fft_size.max(2)
    }

    fn normalized_bin(&self) -> u64 {
        self.bin_hz.max(1)
    }

    fn window_hz(&self) -> u64 {
        self.normalized_bin() * self.normalized_fft_size() as u64
    }
}

struct SpectrumState {
    fft: FftHelper,
    windows: HashMap<u64, Vec<f64>>,
}

/// Virtual receiver: power is read from FFT frames synthesised per tuning
/// window and cached, so repeated reads of a frequency agree.
pub struct VirtualSpectrum {
    config: SpectrumConfig,
    state: Mutex<SpectrumState>,
    closing: AtomicBool,
}

impl VirtualSpectrum {
    pub fn new(config: SpectrumConfig) -> Self {
        let fft = FftHelper::new(config.normalized_fft_size());
        Self {
            config,
            state: Mutex::new(SpectrumState {
                fft,
                windows: HashMap::new(),
            }),
            closing: AtomicBool::new(false),
        }
    }

    /// Marks the device as tearing down; later reads fail.
    pub fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }

    fn bin_level_db(&self, freq_hz: f64, rng: &mut StdRng) -> Vec<f64> {
        let mut levels = Vec::with_capacity(1 + self.config.emitters.len());
        let jitter = self.config.noise_jitter_db.abs();
        let noise = if jitter > 0.0 {
            rng.gen_range(-jitter..jitter)
        } else {
            0.0
        };
        levels.push(self.config.noise_floor_db + noise);
        for emitter in &self.config.emitters {
            let (lo, hi) = emitter.band_hz();
            if freq_hz >= lo && freq_hz <= hi {
                levels.push(emitter.power_db);
            }
        }
        levels
    }

    /// IQ block for one window: one random-phase tone per bin and level.
    fn synthesize(&self, window: u64) -> Vec<Complex32> {
        let size = self.config.normalized_fft_size();
        let bin_hz = self.config.normalized_bin();
        let start = window * self.config.window_hz();
        let half = size / 2;
        let mut rng = StdRng::seed_from_u64(self.config.seed ^ window.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        let mut tones = Vec::new();
        for index in 0..size {
            let freq_hz = (start + index as u64 * bin_hz) as f64;
            let baseband = index as f32 - half as f32;
            for level_db in self.bin_level_db(freq_hz, &mut rng) {
                let amplitude = 10f32.powf(level_db as f32 / 20.0);
                let phase = rng.gen_range(0.0..2.0 * PI);
                tones.push((baseband, amplitude, phase));
            }
        }

        (0..size)
            .map(|n| {
                tones
                    .iter()
                    .map(|&(bin, amplitude, phase)| {
                        Complex32::from_polar(amplitude, 2.0 * PI * bin * n as f32 / size as f32 + phase)
                    })
                    .sum::<Complex32>()
            })
            .collect()
    }

    fn window_power<'a>(&self, window: u64, state: &'a mut SpectrumState) -> &'a [f64] {
        if !state.windows.contains_key(&window) {
            let iq = self.synthesize(window);
            let frame = state.fft.power_db_shifted(&iq);
            debug!(
                "virtual spectrum: computed window {} ({} bins)",
                window,
                frame.len()
            );
            state.windows.insert(window, frame);
        }
        &state.windows[&window]
    }
}

impl Sampler for VirtualSpectrum {
    fn pwr(&self, freq_hz: u64) -> Result<f64, SampleError> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(SampleError::Unavailable("spectrum closing".into()));
        }

        let window_hz = self.config.window_hz();
        let window = freq_hz / window_hz;
        let bin = ((freq_hz % window_hz) / self.config.normalized_bin()) as usize;

        let mut state = self
            .state
            .lock()
            .map_err(|_| SampleError::Unavailable("spectrum state poisoned".into()))?;
        let power = self.window_power(window, &mut state).get(bin).copied();
        power.ok_or_else(|| SampleError::Unavailable(format!("no bin for {} Hz", freq_hz)))
    }
}
