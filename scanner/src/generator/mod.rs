pub mod spectrum;

pub use spectrum::{SpectrumConfig, VirtualSpectrum};
