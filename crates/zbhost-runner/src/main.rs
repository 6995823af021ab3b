use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zbhost_runner::{load_config, DriveOutcome, RunnerConfig};

/// Probe a Zigbee coordinator: read its network parameters, query its
/// firmware and walk its neighbour table.
#[derive(Parser, Debug)]
#[command(name = "zbhost", version, about, long_about = None)]
struct Args {
    /// Path to a YAML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device address (host:port), overrides the configuration
    #[arg(long)]
    connect: Option<String>,

    /// Walk the coordinator's neighbour table
    #[arg(long)]
    scan: bool,

    /// Query the firmware version
    #[arg(long)]
    version_query: bool,

    /// Log wait details and exec labels
    #[arg(short = 'd', long)]
    detail: bool,

    /// Log queue flow and queue dumps
    #[arg(short = 'w', long)]
    flow: bool,

    /// Log every frame sent and received
    #[arg(short = 'f', long)]
    frames: bool,

    /// Log inbound frames before dispatch
    #[arg(short = 'p', long)]
    parsing: bool,

    /// Log raw encoded bytes
    #[arg(short = 'r', long)]
    raw: bool,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(connect) = &self.connect {
            config.connect = connect.clone();
        }
        config.scan |= self.scan;
        config.query_version |= self.version_query;

        let debug = &mut config.scheduler.debug;
        debug.frame_detail |= self.detail;
        debug.flow |= self.flow;
        debug.frames |= self.frames;
        debug.frame_parsing |= self.parsing;
        debug.raw_frames |= self.raw;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    zbhost_runner::metrics::describe_metrics();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RunnerConfig::default(),
    };
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    match zbhost_runner::run(&config).await {
        Ok(report) => {
            info!(
                "Sent {} frame(s) ({} resent), received {}, {} wait(s) exhausted",
                report.stats.frames_sent,
                report.stats.frames_resent,
                report.stats.frames_received,
                report.stats.waits_exhausted
            );
            match report.outcome {
                DriveOutcome::Idle => ExitCode::SUCCESS,
                DriveOutcome::Disconnected => {
                    warn!("Device disconnected before the run finished");
                    ExitCode::FAILURE
                }
                DriveOutcome::WatchdogExpired => {
                    error!("Watchdog expired, link closed");
                    ExitCode::from(2)
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
