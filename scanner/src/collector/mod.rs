pub mod sink;

pub use sink::{JsonLinesSink, LogSink};
