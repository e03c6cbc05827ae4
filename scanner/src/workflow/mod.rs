pub mod config;
pub mod module;

pub use config::ScanConfig;
pub use module::ChannelsModule;
