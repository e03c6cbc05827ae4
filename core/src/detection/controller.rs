use log::{info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::detection::sweep::{Detector, DetectorSettings, StopFlag};
use crate::prelude::{
    DetectorError, DetectorResult, DeviceProfile, ReportSink, Sampler, SweepRange,
};
use crate::telemetry::{MetricsRecorder, SweepMetrics};

/// A sweep thread owned by the controller.
struct ActiveSweep {
    stop: StopFlag,
    exited: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Starts and stops the single background sweep for one module.
///
/// While a sweep is owned, further `start` calls fail with
/// [`DetectorError::AlreadyRunning`]. A sweep that did not exit within the
/// stop timeout stays owned until a later `stop` observes its exit.
pub struct DetectorController {
    sampler: Arc<dyn Sampler>,
    sink: Arc<dyn ReportSink>,
    settings: Arc<DetectorSettings>,
    metrics: Arc<MetricsRecorder>,
    active: Option<ActiveSweep>,
}

impl DetectorController {
    pub fn new(
        sampler: Arc<dyn Sampler>,
        sink: Arc<dyn ReportSink>,
        settings: Arc<DetectorSettings>,
    ) -> Self {
        Self {
            sampler,
            sink,
            settings,
            metrics: Arc::new(MetricsRecorder::new()),
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn settings(&self) -> &Arc<DetectorSettings> {
        &self.settings
    }

    /// Counters for the most recently started sweep.
    pub fn metrics(&self) -> SweepMetrics {
        self.metrics.snapshot()
    }

    pub fn start(&mut self, threshold: f64, profile: &dyn DeviceProfile) -> DetectorResult<()> {
        if self.active.is_some() {
            return Err(DetectorError::AlreadyRunning);
        }

        let range = SweepRange::from_profile(profile)?;
        let metrics = Arc::new(MetricsRecorder::new());
        let detector = Detector::new(
            threshold,
            range,
            self.sampler.clone(),
            self.sink.clone(),
            self.settings.clone(),
        )
        .with_metrics(metrics.clone());

        info!(
            "channel sweep starting: {}..{} Hz, {} points per pass, threshold {}",
            detector.range().min_freq,
            detector.range().max_freq,
            detector.range().points(),
            detector.threshold()
        );

        let stop = StopFlag::new();
        let stop_for_thread = stop.clone();
        let (exited_tx, exited) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("channels-sweep".into())
            .spawn(move || {
                detector.run(&stop_for_thread);
                let _ = exited_tx.send(());
            })?;

        self.metrics = metrics;
        self.active = Some(ActiveSweep {
            stop,
            exited,
            handle,
        });
        Ok(())
    }

    /// Requests a cooperative stop and waits up to `timeout` for the sweep to
    /// reach its next pass boundary. Stopping an idle controller is a no-op.
    pub fn stop(&mut self, timeout: Duration) -> DetectorResult<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        active.stop.request();
        match active.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if active.handle.join().is_err() {
                    warn!("channel sweep thread panicked");
                }
                let metrics = self.metrics.snapshot();
                info!(
                    "channel sweep stopped after {} passes, {} reports",
                    metrics.passes, metrics.reports
                );
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("channel sweep still running after {:?}", timeout);
                self.active = Some(active);
                Err(DetectorError::StopTimeout(timeout))
            }
        }
    }
}

impl Drop for DetectorController {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.stop.request();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{SampleError, SinkError};
    use crate::report::ChannelReport;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    struct Profile;

    impl DeviceProfile for Profile {
        fn max_freq_hz(&self) -> u64 {
            1_050_000
        }
        fn min_freq_hz(&self) -> u64 {
            1_000_000
        }
        fn step_hz(&self) -> u64 {
            5_000
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ChannelReport>>);

    impl ReportSink for RecordingSink {
        fn send(&self, report: ChannelReport) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(report);
            Ok(())
        }
    }

    fn tone_sampler() -> Arc<dyn Sampler> {
        Arc::new(|freq: u64| -> Result<f64, SampleError> {
            thread::sleep(Duration::from_micros(200));
            if (1_010_000..1_025_000).contains(&freq) {
                Ok(-10.0)
            } else {
                Ok(-60.0)
            }
        })
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn started_sweep_reports_every_pass_until_stopped() {
        let sink = Arc::new(RecordingSink::default());
        let mut controller = DetectorController::new(
            tone_sampler(),
            sink.clone(),
            Arc::new(DetectorSettings::new(false)),
        );

        controller.start(-30.0, &Profile).unwrap();
        assert!(controller.is_running());
        wait_for(|| controller.metrics().passes >= 2);
        controller.stop(Duration::from_secs(3)).unwrap();
        assert!(!controller.is_running());

        let metrics = controller.metrics();
        let reports = sink.0.lock().unwrap();
        assert!(metrics.passes >= 2);
        assert_eq!(reports.len(), metrics.reports);
        assert!(reports.iter().all(|r| r.center_freq == 1_020_000));
    }

    #[test]
    fn second_start_is_rejected_while_running() {
        let mut controller = DetectorController::new(
            tone_sampler(),
            Arc::new(RecordingSink::default()),
            Arc::new(DetectorSettings::new(false)),
        );

        controller.start(-30.0, &Profile).unwrap();
        let err = controller.start(-20.0, &Profile).unwrap_err();
        assert!(matches!(err, DetectorError::AlreadyRunning));
        assert!(controller.is_running());

        controller.stop(Duration::from_secs(3)).unwrap();
        controller.start(-20.0, &Profile).unwrap();
        controller.stop(Duration::from_secs(3)).unwrap();
    }

    #[test]
    fn stop_on_idle_controller_is_noop() {
        let mut controller = DetectorController::new(
            tone_sampler(),
            Arc::new(RecordingSink::default()),
            Arc::new(DetectorSettings::new(false)),
        );
        controller.stop(Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn slow_sweep_keeps_slot_until_it_exits() {
        let hold = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = hold.clone();
        let counter = calls.clone();
        let sampler: Arc<dyn Sampler> = Arc::new(move |_freq: u64| -> Result<f64, SampleError> {
            counter.fetch_add(1, Ordering::SeqCst);
            while gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(-60.0)
        });
        let mut controller = DetectorController::new(
            sampler,
            Arc::new(RecordingSink::default()),
            Arc::new(DetectorSettings::new(false)),
        );

        controller.start(-30.0, &Profile).unwrap();
        // the sweep must be blocked inside the sampler before stop is requested
        wait_for(|| calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let err = controller.stop(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, DetectorError::StopTimeout(_)));
        assert!(controller.is_running());
        assert!(matches!(
            controller.start(-30.0, &Profile),
            Err(DetectorError::AlreadyRunning)
        ));

        hold.store(false, Ordering::SeqCst);
        controller.stop(Duration::from_secs(3)).unwrap();
        assert!(!controller.is_running());
    }

    #[test]
    fn stop_mid_pass_finishes_only_the_current_pass() {
        // 10 points per pass; the 15th read blocks halfway through the second pass
        let calls = Arc::new(AtomicUsize::new(0));
        let hold = Arc::new(AtomicBool::new(true));
        let counter = calls.clone();
        let gate = hold.clone();
        let sampler: Arc<dyn Sampler> = Arc::new(move |_freq: u64| -> Result<f64, SampleError> {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 15 {
                while gate.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(1));
                }
            }
            Ok(-60.0)
        });
        let mut controller = DetectorController::new(
            sampler,
            Arc::new(RecordingSink::default()),
            Arc::new(DetectorSettings::new(false)),
        );

        controller.start(-30.0, &Profile).unwrap();
        wait_for(|| calls.load(Ordering::SeqCst) >= 15);
        let passes_at_stop = controller.metrics().passes;
        assert_eq!(passes_at_stop, 1);

        let release = {
            let hold = hold.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                hold.store(false, Ordering::SeqCst);
            })
        };
        controller.stop(Duration::from_secs(3)).unwrap();
        release.join().unwrap();

        assert_eq!(controller.metrics().passes, passes_at_stop + 1);
        assert_eq!(calls.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn invalid_profile_starts_nothing() {
        struct Broken;
        impl DeviceProfile for Broken {
            fn max_freq_hz(&self) -> u64 {
                10
            }
            fn min_freq_hz(&self) -> u64 {
                0
            }
            fn step_hz(&self) -> u64 {
                0
            }
        }

        let mut controller = DetectorController::new(
            tone_sampler(),
            Arc::new(RecordingSink::default()),
            Arc::new(DetectorSettings::new(false)),
        );
        assert!(matches!(
            controller.start(-30.0, &Broken),
            Err(DetectorError::InvalidRange(_))
        ));
        assert!(!controller.is_running());
    }
}
