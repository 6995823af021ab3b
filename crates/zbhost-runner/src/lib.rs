//! Host process for zbhost.
//!
//! Connects to a transceiver (or a bridge exposing it) over TCP, runs a
//! [`ProbeSession`] through the orchestration engine, and reports what it
//! found.
//!
//! - [`config`]: YAML run configuration
//! - [`ChannelTransport`]: the engine's transport, backed by a tokio channel
//! - [`drive`]: the async event loop joining scheduler, socket and timers
//! - [`session`]: the device logic

pub mod config;
mod driver;
mod error;
mod link;
pub mod metrics;
pub mod session;

pub use config::{load_config, load_config_from_str, ParamId, ParamWrite, RunnerConfig};
pub use driver::{drive, DriveOutcome};
pub use error::{ConfigError, RunnerError};
pub use link::ChannelTransport;
pub use session::{Neighbor, ProbeSession, WriteOutcome};

use tokio::net::TcpStream;
use tracing::info;
use zbhost_core::{Scheduler, SchedulerStats};
use zbhost_frame::JsonLineCodec;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Why the link driver stopped.
    pub outcome: DriveOutcome,
    /// Engine counters at the end of the run.
    pub stats: SchedulerStats,
    /// Final session state.
    pub session: ProbeSession,
}

/// Build the scheduler for a probe session over `transport`.
pub fn build_scheduler(
    config: &RunnerConfig,
    transport: ChannelTransport,
) -> Scheduler<ProbeSession> {
    Scheduler::new(
        config.scheduler.clone(),
        ProbeSession::new(config),
        JsonLineCodec::new(),
        transport,
    )
    .with_dispatch(session::dispatch_table())
    .with_wait_timeout_notifier(session::note_wait_timeout)
}

/// Connect to the configured device and run the probe session.
pub async fn run(config: &RunnerConfig) -> Result<RunReport, RunnerError> {
    info!("Connecting to {}", config.connect);
    let stream = TcpStream::connect(&config.connect).await?;
    stream.set_nodelay(true)?;

    let (transport, outbound) = ChannelTransport::new();
    let mut sched = build_scheduler(config, transport);
    session::start(&mut sched)?;

    let exit_when_idle = config.exit_when_idle;
    let outcome = drive(&mut sched, stream, outbound, |s| {
        exit_when_idle && session::is_finished(s)
    })
    .await?;

    info!("Run ended: {:?}", outcome);
    Ok(RunReport {
        outcome,
        stats: sched.stats().clone(),
        session: sched.into_state(),
    })
}
