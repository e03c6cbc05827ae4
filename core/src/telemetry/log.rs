use log::info;

use crate::report::MODULE_NAME;

/// Operator-facing console. Every line is tagged with the owning module.
#[derive(Debug, Clone)]
pub struct LogManager {
    module: String,
}

impl LogManager {
    pub fn new() -> Self {
        Self::for_module(MODULE_NAME)
    }

    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    pub fn format(&self, message: &str) -> String {
        format!("[{}] {}", self.module, message)
    }

    pub fn record(&self, message: &str) {
        info!("{}", self.format(message));
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
