use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::report::ChannelReport;

/// Frequency range walked by one sweep pass, in integer Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRange {
    pub min_freq: u64,
    pub max_freq: u64,
    pub step: u64,
}

impl SweepRange {
    pub fn new(min_freq: u64, max_freq: u64, step: u64) -> Self {
        Self {
            min_freq,
            max_freq,
            step,
        }
    }

    /// Reads the device capabilities once and checks the sweep can terminate.
    pub fn from_profile(profile: &dyn DeviceProfile) -> DetectorResult<Self> {
        let range = Self::new(profile.min_freq_hz(), profile.max_freq_hz(), profile.step_hz());
        if range.step == 0 {
            return Err(DetectorError::InvalidRange("step must be positive".into()));
        }
        if range.min_freq >= range.max_freq {
            return Err(DetectorError::InvalidRange(format!(
                "min {} Hz is not below max {} Hz",
                range.min_freq, range.max_freq
            )));
        }
        Ok(range)
    }

    /// Number of sample points in one pass.
    pub fn points(&self) -> u64 {
        if self.step == 0 {
            return 0;
        }
        (self.max_freq.saturating_sub(self.min_freq) + self.step - 1) / self.step
    }
}

/// Read-only device capability data consulted when a detector is built.
pub trait DeviceProfile {
    fn max_freq_hz(&self) -> u64;
    fn min_freq_hz(&self) -> u64;
    fn step_hz(&self) -> u64;
}

/// Source of instantaneous power at a frequency.
pub trait Sampler: Send + Sync {
    fn pwr(&self, freq_hz: u64) -> Result<f64, SampleError>;
}

impl<F> Sampler for F
where
    F: Fn(u64) -> Result<f64, SampleError> + Send + Sync,
{
    fn pwr(&self, freq_hz: u64) -> Result<f64, SampleError> {
        self(freq_hz)
    }
}

/// Destination for detected-channel reports. Delivery is attempted once.
pub trait ReportSink: Send + Sync {
    fn send(&self, report: ChannelReport) -> Result<(), SinkError>;
}

#[derive(thiserror::Error, Debug)]
pub enum SampleError {
    #[error("sampler unavailable: {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding failure: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors surfaced by the detector and its owning module.
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("module already running")]
    AlreadyRunning,
    #[error("sweep did not stop within {0:?}")]
    StopTimeout(Duration),
    #[error("invalid sweep range: {0}")]
    InvalidRange(String),
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
    #[error("failed to spawn sweep thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
