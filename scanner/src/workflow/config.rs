use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use sweepcore::DeviceProfile;

use crate::generator::SpectrumConfig;

/// Sweep capabilities of the receiving device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub kind: String,
    pub min_freq_mhz: f64,
    pub max_freq_mhz: f64,
    pub step_hz: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kind: "virtual".into(),
            min_freq_mhz: 100.0,
            max_freq_mhz: 110.0,
            step_hz: 5_000,
        }
    }
}

impl DeviceProfile for DeviceConfig {
    fn max_freq_hz(&self) -> u64 {
        (self.max_freq_mhz * 1e6) as u64
    }

    fn min_freq_hz(&self) -> u64 {
        (self.min_freq_mhz * 1e6) as u64
    }

    fn step_hz(&self) -> u64 {
        self.step_hz
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub device: DeviceConfig,
    pub spectrum: SpectrumConfig,
    pub thread_timeout_secs: u64,
    pub pass_delay_ms: u64,
    pub print_all: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            spectrum: SpectrumConfig::default(),
            thread_timeout_secs: 3,
            pass_delay_ms: 0,
            print_all: false,
        }
    }
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scan config {}", path_ref.display()))?;
        let config: ScanConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scan config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn thread_timeout(&self) -> Duration {
        Duration::from_secs(self.thread_timeout_secs)
    }

    pub fn pass_delay(&self) -> Duration {
        Duration::from_millis(self.pass_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_profile_converts_mhz_to_hz() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.device.min_freq_hz(), 100_000_000);
        assert_eq!(cfg.device.max_freq_hz(), 110_000_000);
        assert_eq!(cfg.device.step_hz(), 5_000);
        assert_eq!(cfg.thread_timeout(), Duration::from_secs(3));
        assert!(cfg.pass_delay().is_zero());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"device:\n  min_freq_mhz: 433.0\n  max_freq_mhz: 435.0\n  step_hz: 10000\nprint_all: true\nspectrum:\n  seed: 9\n  emitters:\n    - center_mhz: 433.92\n      bandwidth_khz: 50\n      power_db: -12\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScanConfig::load(&path).unwrap();
        assert_eq!(cfg.device.min_freq_hz(), 433_000_000);
        assert_eq!(cfg.device.step_hz, 10_000);
        assert_eq!(cfg.device.kind, "virtual");
        assert!(cfg.print_all);
        assert_eq!(cfg.spectrum.seed, 9);
        assert_eq!(cfg.spectrum.emitters.len(), 1);
        assert_eq!(cfg.spectrum.fft_size, 256);
        assert_eq!(cfg.thread_timeout_secs, 3);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = ScanConfig::load("/nonexistent/scan.yaml").unwrap_err();
        assert!(err.to_string().contains("reading scan config"));
    }
}
