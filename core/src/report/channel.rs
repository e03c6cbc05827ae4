use serde::{Deserialize, Serialize};

/// Identifies channel reports to downstream consumers.
pub const MODULE_ID: u32 = 10;
pub const PROTOCOL_VERSION: u32 = 1;
pub const MODULE_NAME: &str = "channels";

/// One closed above-threshold region, emitted once and handed to the sink.
///
/// Field names on the wire follow the collector payload
/// (`module`, `protocol`, `center`, `bw`, `pwr`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    #[serde(rename = "module")]
    pub module_id: u32,
    #[serde(rename = "protocol")]
    pub protocol_version: u32,
    #[serde(rename = "center")]
    pub center_freq: u64,
    #[serde(rename = "bw")]
    pub bandwidth: u64,
    #[serde(rename = "pwr")]
    pub center_power: f64,
}

impl ChannelReport {
    pub fn new(center_freq: u64, bandwidth: u64, center_power: f64) -> Self {
        Self {
            module_id: MODULE_ID,
            protocol_version: PROTOCOL_VERSION,
            center_freq,
            bandwidth,
            center_power,
        }
    }

    /// Operator-facing summary line.
    pub fn console_line(&self) -> String {
        format!(
            "center: {}, center pwr: {:.2}, bandwidth: {}",
            self.center_freq, self.center_power, self.bandwidth
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
