use std::sync::Arc;
use std::time::Duration;
use sweepcore::detection::{DetectorController, DetectorSettings};
use sweepcore::prelude::{DetectorError, DetectorResult};
use sweepcore::telemetry::{LogManager, SweepMetrics};
use sweepcore::{DeviceProfile, ReportSink, Sampler};

use crate::workflow::config::ScanConfig;

/// Device kinds the channels module can sweep.
pub const DEVICE_KINDS: [&str; 2] = ["hackrf", "virtual"];

/// Find channels in the spectrum.
///
/// Usage: `run channels <devid> <threshold>`, e.g. `run channels 0 -30`.
///
/// Settings:
/// * `print_all`: print channels as they are seen
pub struct ChannelsModule {
    description: &'static str,
    console: LogManager,
    controller: DetectorController,
    thread_timeout: Duration,
}

impl ChannelsModule {
    pub fn new(sampler: Arc<dyn Sampler>, sink: Arc<dyn ReportSink>, config: &ScanConfig) -> Self {
        let settings =
            DetectorSettings::new(config.print_all).with_pass_delay(config.pass_delay());
        let console = LogManager::new();
        console.record("loaded");
        Self {
            description: "channels module",
            console,
            controller: DetectorController::new(sampler, sink, Arc::new(settings)),
            thread_timeout: config.thread_timeout(),
        }
    }

    pub fn description(&self) -> &str {
        self.description
    }

    pub fn supports(&self, device_kind: &str) -> bool {
        DEVICE_KINDS.contains(&device_kind)
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn metrics(&self) -> SweepMetrics {
        self.controller.metrics()
    }

    /// Parses `cmdline` as an integer threshold and starts the sweep on `devid`.
    pub fn run(
        &mut self,
        devid: u32,
        cmdline: &str,
        profile: &dyn DeviceProfile,
    ) -> DetectorResult<()> {
        let threshold: i64 = match cmdline.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                self.console.record("invalid threshold");
                return Err(DetectorError::InvalidThreshold(cmdline.to_string()));
            }
        };

        if self.controller.is_running() {
            self.console.record("module already running");
            return Err(DetectorError::AlreadyRunning);
        }

        self.controller.start(threshold as f64, profile)?;
        self.console
            .record(&format!("{} added on device {}", self.description, devid));
        Ok(())
    }

    pub fn stop(&mut self) -> DetectorResult<()> {
        self.controller.stop(self.thread_timeout)
    }

    pub fn set_setting(&self, name: &str, enabled: bool) -> DetectorResult<()> {
        match name {
            "print_all" => {
                self.controller.settings().set_print_all(enabled);
                Ok(())
            }
            other => Err(DetectorError::UnknownSetting(other.to_string())),
        }
    }
}
