use anyhow::{bail, Context};
use clap::Parser;
use collector::{JsonLinesSink, LogSink};
use generator::VirtualSpectrum;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweepcore::ReportSink;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::{ChannelsModule, ScanConfig};

mod collector;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Sweep a frequency range and report detected channels")]
struct Args {
    /// Power threshold as an integer, e.g. -30
    #[arg(allow_hyphen_values = true)]
    threshold: String,
    /// Load a scan config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Device id announced when the module starts
    #[arg(long, default_value_t = 0)]
    device: u32,
    /// Print every channel as it is seen
    #[arg(long, default_value_t = false)]
    verbose: bool,
    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration: Option<u64>,
    /// Append reports as JSON lines to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.config {
        ScanConfig::load(path)?
    } else {
        ScanConfig::default()
    };

    let spectrum = Arc::new(VirtualSpectrum::new(config.spectrum.clone()));
    let sink: Arc<dyn ReportSink> = match &args.output {
        Some(path) => {
            let sink = JsonLinesSink::create(path)?;
            info!("writing channel reports to {}", sink.path().display());
            Arc::new(sink)
        }
        None => Arc::new(LogSink::new()),
    };

    let mut module = ChannelsModule::new(spectrum.clone(), sink, &config);
    if !module.supports(&config.device.kind) {
        bail!("device kind {} is not supported", config.device.kind);
    }
    if config.device.kind != "virtual" {
        bail!("{} acquisition is not built in; use the virtual device", config.device.kind);
    }
    if args.verbose {
        module.set_setting("print_all", true)?;
    }
    module
        .run(args.device, &args.threshold, &config.device)
        .context("starting channels module")?;

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    runtime.block_on(async {
        match args.duration {
            Some(secs) => {
                tokio::select! {
                    result = signal::ctrl_c() => result.context("awaiting Ctrl+C to exit")?,
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                }
            }
            None => signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?,
        }
        Ok::<(), anyhow::Error>(())
    })?;

    let stopped = module.stop();
    spectrum.close();
    stopped.context("stopping channels module")?;

    let metrics = module.metrics();
    println!(
        "{} finished -> passes {}, reports {}, discarded {}, sample failures {}, dropped reports {}",
        module.description(),
        metrics.passes,
        metrics.reports,
        metrics.discarded_regions,
        metrics.sample_failures,
        metrics.send_failures
    );

    Ok(())
}
