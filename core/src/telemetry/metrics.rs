use std::sync::Mutex;

/// Counters describing sweep activity since the detector was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepMetrics {
    pub passes: usize,
    pub reports: usize,
    pub discarded_regions: usize,
    pub sample_failures: usize,
    pub send_failures: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<SweepMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SweepMetrics::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut SweepMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_pass(&self) {
        self.update(|m| m.passes += 1);
    }

    pub fn record_report(&self) {
        self.update(|m| m.reports += 1);
    }

    pub fn record_discarded_region(&self) {
        self.update(|m| m.discarded_regions += 1);
    }

    pub fn record_sample_failure(&self) {
        self.update(|m| m.sample_failures += 1);
    }

    pub fn record_send_failure(&self) {
        self.update(|m| m.send_failures += 1);
    }

    pub fn snapshot(&self) -> SweepMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            SweepMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
