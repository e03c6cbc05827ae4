pub mod controller;
pub mod region;
pub mod sweep;

pub use controller::DetectorController;
pub use region::{ClosedRegion, ROUND_TO};
pub use sweep::{Detector, DetectorSettings, StopFlag};
