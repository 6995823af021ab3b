//! Command orchestration engine for a Zigbee transceiver host.
//!
//! The engine serialises a host's conversation with a transceiver that
//! answers one request at a time. Work is expressed as [`Command`]s queued
//! by priority; the [`Scheduler`] runs them in order, stalls on every
//! [`WaitSpec`] until a matching frame arrives, resends on timeout, drains
//! the device's buffered indications when asked to, and closes the link if
//! nothing has been sent for too long.
//!
//! # Overview
//!
//! - [`CommandQueue`]: priority insertion with `enqueue` / `enqueue_front`
//! - [`Scheduler`]: the cooperative run loop, frame arrival and timers
//! - [`WaitSpec`]: frame expectations with completion and timeout callbacks
//! - [`retry`]: the per-wait state machine
//! - [`Watchdog`]: transport liveness
//! - [`DispatchTable`]: device-logic handlers by frame type and ZDO cluster
//! - [`Property`]: deferred write completion over a oneshot channel
//!
//! # Example
//!
//! ```rust
//! use zbhost_core::{Command, ManualClock, MemoryTransport, Scheduler, SchedulerConfig, WaitSpec};
//! use zbhost_frame::{Frame, FrameType, JsonLineCodec};
//!
//! let transport = MemoryTransport::new();
//! let mut sched = Scheduler::new(SchedulerConfig::default(), 0u32, JsonLineCodec::new(), transport.clone())
//!     .with_clock(ManualClock::new());
//!
//! let wait = WaitSpec::for_type(FrameType::Version).on_match(|s: &mut Scheduler<u32>, frame: &Frame| {
//!     *s.state_mut() = frame.get_as("version").unwrap_or_default();
//!     Ok(())
//! });
//! sched.enqueue(vec![Command::send(Frame::new(FrameType::Version)), Command::wait(wait)]).unwrap();
//! assert_eq!(transport.sent().len(), 1);
//!
//! sched.on_frame(Frame::new(FrameType::Version).with("version", 0x2670_0500u32)).unwrap();
//! assert_eq!(*sched.state(), 0x2670_0500);
//! assert!(sched.is_idle());
//! ```

mod clock;
mod command;
mod config;
mod dispatch;
mod drain;
mod error;
pub mod metrics;
mod property;
mod queue;
pub mod retry;
mod scheduler;
mod transport;
mod wait;
mod watchdog;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{send_and_wait, Batch, Command, CommandKind, CommandTag, Exec, ExecFn};
pub use config::{DebugFlags, SchedulerConfig, WAIT_RETRY_MAX, WAIT_TIMEOUT_MS, WATCHDOG_TIMEOUT_MS};
pub use dispatch::{DispatchTable, FrameHandler, Route};
pub use drain::{drain_commands, DrainTracker, DRAIN_PRIORITY};
pub use error::{QueueError, Result, SchedulerError, TransportError};
pub use property::{Property, PropertyHandle};
pub use queue::CommandQueue;
pub use retry::{on_wait_expired, on_wait_frame, TimeoutAction, WaitState};
pub use scheduler::{Scheduler, SchedulerStats, TimeoutNotifier};
pub use transport::{MemoryTransport, Transport};
pub use wait::{MatchCallback, TimeoutCallback, WaitSpec};
pub use watchdog::Watchdog;
