//! Async link driver.
//!
//! Connects the synchronous [`Scheduler`] to a TCP socket. One task owns
//! both: outbound bytes queued by the [`ChannelTransport`](crate::ChannelTransport)
//! are written to the socket, inbound bytes are decoded and handed to
//! [`Scheduler::on_frame`], and the scheduler's next timer deadline is
//! slept on so `poll_timers` runs on time.

use std::time::Instant;

use ::metrics::counter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace, warn};
use zbhost_core::Scheduler;
use zbhost_frame::{FrameDecoder, JsonLineCodec};

use crate::metrics::metric_defs;
use crate::RunnerError;

/// Read buffer size for the socket.
const READ_BUFFER_SIZE: usize = 1024;

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The caller's completion check passed.
    Idle,
    /// The device closed the connection.
    Disconnected,
    /// The watchdog closed the link.
    WatchdogExpired,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Run the scheduler against `stream` until `done` reports completion, the
/// device disconnects, or the watchdog trips.
///
/// Fatal scheduler errors and socket failures end the run with an error.
pub async fn drive<D, F>(
    sched: &mut Scheduler<D>,
    mut stream: TcpStream,
    mut outbound: UnboundedReceiver<Vec<u8>>,
    done: F,
) -> Result<DriveOutcome, RunnerError>
where
    F: Fn(&Scheduler<D>) -> bool,
{
    let (mut reader, mut writer) = stream.split();
    let mut codec = JsonLineCodec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        if sched.is_link_closed() {
            return Ok(DriveOutcome::WatchdogExpired);
        }
        if done(&*sched) {
            while let Ok(data) = outbound.try_recv() {
                writer.write_all(&data).await?;
            }
            writer.flush().await?;
            debug!("Link driver finished: {:?}", sched.stats());
            return Ok(DriveOutcome::Idle);
        }

        let deadline = sched.next_deadline();

        tokio::select! {
            biased;

            // ================================================================
            // Scheduler -> device
            // ================================================================
            Some(data) = outbound.recv() => {
                writer.write_all(&data).await?;
                writer.flush().await?;
                counter!(metric_defs::LINK_BYTES_WRITTEN.name).increment(data.len() as u64);
            }

            // ================================================================
            // Device -> scheduler
            // ================================================================
            result = reader.read(&mut buf) => {
                let n = result?;
                if n == 0 {
                    warn!("Device closed the connection");
                    return Ok(DriveOutcome::Disconnected);
                }
                trace!("Read {} bytes from device", n);
                counter!(metric_defs::LINK_BYTES_READ.name).increment(n as u64);
                codec.push(&buf[..n]);
                loop {
                    match codec.decode_frame() {
                        Ok(Some(frame)) => sched.on_frame(frame)?,
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Dropping undecodable frame: {}", e);
                            counter!(metric_defs::LINK_DECODE_ERRORS.name).increment(1);
                        }
                    }
                }
            }

            // ================================================================
            // Timers
            // ================================================================
            _ = sleep_until(deadline) => {
                sched.poll_timers()?;
            }
        }
    }
}
