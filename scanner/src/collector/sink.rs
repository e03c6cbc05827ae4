use anyhow::Context;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sweepcore::telemetry::LogManager;
use sweepcore::{ChannelReport, ReportSink, SinkError};

/// Appends every report as one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    pub fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening report file {}", path.display()))?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonLinesSink {
    fn send(&self, report: ChannelReport) -> Result<(), SinkError> {
        let line = report.to_json()?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Unavailable("report writer poisoned".into()))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Reports go to the operator console only.
#[derive(Default)]
pub struct LogSink {
    console: LogManager,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for LogSink {
    fn send(&self, report: ChannelReport) -> Result<(), SinkError> {
        self.console.record(&format!(
            "channel {} Hz, {} Hz wide, {:.2}",
            report.center_freq, report.bandwidth, report.center_power
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_sink_appends_one_line_per_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports/channels.jsonl");
        let sink = JsonLinesSink::create(&path).unwrap();

        sink.send(ChannelReport::new(101_100_000, 200_000, -20.13)).unwrap();
        sink.send(ChannelReport::new(104_500_000, 150_000, -25.0)).unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: ChannelReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.center_freq, 101_100_000);
        assert!(lines[1].contains("\"bw\":150000"));
    }

    #[test]
    fn json_sink_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.jsonl");
        fs::write(&path, "{}\n").unwrap();

        let sink = JsonLinesSink::create(&path).unwrap();
        sink.send(ChannelReport::new(1_000_000, 5_000, -1.0)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn log_sink_accepts_reports() {
        assert!(LogSink::new()
            .send(ChannelReport::new(1_000_000, 5_000, -1.0))
            .is_ok());
    }
}
