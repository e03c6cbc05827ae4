use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::detection::region::ClosedRegion;
use crate::prelude::{ReportSink, Sampler, SweepRange};
use crate::report::ChannelReport;
use crate::telemetry::{LogManager, MetricsRecorder};

/// Shared cooperative stop request, polled at every pass boundary and during the pass delay.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleeps up to `timeout`, waking early once a stop is requested.
    /// Returns whether a stop was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_requested() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
        true
    }
}

const STOP_POLL: Duration = Duration::from_millis(10);

/// Operator settings shared between the owning module and a running sweep.
#[derive(Debug, Default)]
pub struct DetectorSettings {
    print_all: AtomicBool,
    pass_delay: Duration,
}

impl DetectorSettings {
    pub fn new(print_all: bool) -> Self {
        Self {
            print_all: AtomicBool::new(print_all),
            pass_delay: Duration::ZERO,
        }
    }

    /// Pause inserted after each full pass. Zero keeps sweeping back-to-back.
    pub fn with_pass_delay(mut self, delay: Duration) -> Self {
        self.pass_delay = delay;
        self
    }

    pub fn print_all(&self) -> bool {
        self.print_all.load(Ordering::Relaxed)
    }

    pub fn set_print_all(&self, enabled: bool) {
        self.print_all.store(enabled, Ordering::Relaxed);
    }

    pub fn pass_delay(&self) -> Duration {
        self.pass_delay
    }
}

/// Position of the sweep relative to an above-threshold run.
#[derive(Debug, Clone, PartialEq)]
enum SweepState {
    Idle,
    InChannel { enter_freq: u64, powers: Vec<f64> },
}

/// Walks the configured range, closing above-threshold runs into reports.
pub struct Detector {
    threshold: f64,
    range: SweepRange,
    sampler: Arc<dyn Sampler>,
    sink: Arc<dyn ReportSink>,
    settings: Arc<DetectorSettings>,
    metrics: Arc<MetricsRecorder>,
    console: LogManager,
}

impl Detector {
    pub fn new(
        threshold: f64,
        range: SweepRange,
        sampler: Arc<dyn Sampler>,
        sink: Arc<dyn ReportSink>,
        settings: Arc<DetectorSettings>,
    ) -> Self {
        Self {
            threshold,
            range,
            sampler,
            sink,
            settings,
            metrics: Arc::new(MetricsRecorder::new()),
            console: LogManager::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn range(&self) -> SweepRange {
        self.range
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sweeps until `stop` is observed at a pass boundary.
    pub fn run(&self, stop: &StopFlag) {
        debug!(
            "sweeping {}..{} Hz step {} Hz, threshold {}",
            self.range.min_freq, self.range.max_freq, self.range.step, self.threshold
        );
        while !stop.is_requested() {
            self.sweep_pass();
            self.metrics.record_pass();

            let delay = self.settings.pass_delay();
            if !delay.is_zero() && stop.wait(delay) {
                break;
            }
        }
        debug!("sweep stopped");
    }

    /// One traversal of the range. Returns the number of delivered reports.
    pub fn sweep_pass(&self) -> usize {
        let mut state = SweepState::Idle;
        let mut delivered = 0;
        let mut freq = self.range.min_freq;

        while freq < self.range.max_freq {
            match self.sampler.pwr(freq) {
                Ok(power) => {
                    let (next, closed) = self.advance(state, freq, power);
                    state = next;
                    if let Some(region) = closed {
                        if self.close(region) {
                            delivered += 1;
                        }
                    }
                }
                Err(err) => {
                    debug!("no sample at {} Hz: {}", freq, err);
                    self.metrics.record_sample_failure();
                }
            }

            freq = match freq.checked_add(self.range.step) {
                Some(next) => next,
                None => break,
            };
        }

        if let SweepState::InChannel { enter_freq, .. } = state {
            debug!(
                "region entered at {} Hz still open at range end, discarded",
                enter_freq
            );
            self.metrics.record_discarded_region();
        }

        delivered
    }

    fn advance(
        &self,
        state: SweepState,
        freq: u64,
        power: f64,
    ) -> (SweepState, Option<ClosedRegion>) {
        let above = power > self.threshold;
        match state {
            SweepState::Idle if above => (
                SweepState::InChannel {
                    enter_freq: freq,
                    powers: vec![power],
                },
                None,
            ),
            SweepState::Idle => (SweepState::Idle, None),
            SweepState::InChannel {
                enter_freq,
                mut powers,
            } if above => {
                powers.push(power);
                (SweepState::InChannel { enter_freq, powers }, None)
            }
            SweepState::InChannel { enter_freq, powers } => (
                SweepState::Idle,
                Some(ClosedRegion::new(enter_freq, freq, powers)),
            ),
        }
    }

    fn close(&self, region: ClosedRegion) -> bool {
        let report = match region.measure(self.sampler.as_ref(), self.range.step) {
            Ok(report) => report,
            Err(err) => {
                debug!(
                    "center sample for region {}..{} Hz failed, region dropped: {}",
                    region.enter_freq, region.left_freq, err
                );
                self.metrics.record_sample_failure();
                return false;
            }
        };

        if self.settings.print_all() {
            self.console.record(&report.console_line());
        }
        self.emit(report)
    }

    fn emit(&self, report: ChannelReport) -> bool {
        match self.sink.send(report) {
            Ok(()) => {
                self.metrics.record_report();
                true
            }
            Err(err) => {
                debug!("channel report dropped: {}", err);
                self.metrics.record_send_failure();
                false
            }
        }
    }
}
