pub mod channel;

pub use channel::{ChannelReport, MODULE_ID, MODULE_NAME, PROTOCOL_VERSION};
