//! Channel detection core for continuous spectrum sweeps.
//!
//! A [`Detector`] walks a frequency range against a power [`Sampler`],
//! tracks runs of samples above a threshold and emits one
//! [`ChannelReport`] per closed run to a [`ReportSink`]. The
//! [`DetectorController`] owns the single background sweep for a module.

pub mod detection;
pub mod math;
pub mod prelude;
pub mod report;
pub mod telemetry;

pub use detection::{Detector, DetectorController, DetectorSettings, StopFlag};
pub use prelude::{
    DetectorError, DeviceProfile, ReportSink, SampleError, Sampler, SinkError, SweepRange,
};
pub use report::ChannelReport;
