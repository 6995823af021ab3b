//! The command scheduler.
//!
//! [`Scheduler`] owns the command queue and runs it cooperatively on a single
//! thread. It pops commands until the queue is empty or a `WaitFrame` is
//! reached; a wait stalls the queue until a matching frame arrives through
//! [`Scheduler::on_frame`] or its timer fires in [`Scheduler::poll_timers`].
//!
//! The scheduler never blocks and never sleeps. The host owns the event
//! loop: it feeds inbound frames, calls `poll_timers` no later than
//! [`Scheduler::next_deadline`], and stops once
//! [`Scheduler::is_link_closed`] reports a watchdog trip.
//!
//! Device-specific state lives in the `D` parameter and is reachable from
//! every callback through [`Scheduler::state_mut`].

use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use tracing::{debug, info, trace, warn};
use zbhost_frame::{Frame, FrameEncoder};

use crate::drain::{drain_commands, DrainTracker};
use crate::metrics::metric_defs;
use crate::retry::{on_wait_expired, on_wait_frame, PendingWait, TimeoutAction, WaitState};
use crate::{
    send_and_wait, Batch, Clock, Command, CommandKind, CommandQueue, DispatchTable, Result,
    Route, SchedulerConfig, SystemClock, Transport, WaitSpec, Watchdog,
};

/// Called with the last transmitted frame whenever a wait is exhausted.
pub type TimeoutNotifier<D> = Box<dyn FnMut(&mut D, Option<&Frame>)>;

/// Log at `info` when the given debug flag is set, at `trace` otherwise.
macro_rules! log_if {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            info!($($arg)+)
        } else {
            trace!($($arg)+)
        }
    };
}

/// Running totals kept by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Frames transmitted, resends included.
    pub frames_sent: u64,
    /// Frames re-transmitted by a retry.
    pub frames_resent: u64,
    /// Frames received.
    pub frames_received: u64,
    /// Waits satisfied.
    pub waits_matched: u64,
    /// Wait timeouts that led to a resend.
    pub wait_retries: u64,
    /// Waits that ran out of attempts.
    pub waits_exhausted: u64,
    /// Drain cycles started.
    pub drains_injected: u64,
    /// Watchdog trips.
    pub watchdog_trips: u64,
}

/// Single-threaded command scheduler.
pub struct Scheduler<D> {
    config: SchedulerConfig,
    state: D,
    queue: CommandQueue<D>,
    pending: Option<PendingWait<D>>,
    last_wait_state: Option<WaitState>,
    last_sent: Option<Frame>,
    running: bool,
    drain: DrainTracker,
    dispatch: DispatchTable<D>,
    timeout_notifier: Option<TimeoutNotifier<D>>,
    watchdog: Watchdog,
    link_closed: bool,
    encoder: Box<dyn FrameEncoder>,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
    stats: SchedulerStats,
}

impl<D> Scheduler<D> {
    /// Create a scheduler on the system clock.
    ///
    /// The watchdog starts counting immediately.
    pub fn new(
        config: SchedulerConfig,
        state: D,
        encoder: impl FrameEncoder + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        let clock = SystemClock;
        let watchdog = Watchdog::new(config.watchdog_timeout(), clock.now());
        Scheduler {
            config,
            state,
            queue: CommandQueue::new(),
            pending: None,
            last_wait_state: None,
            last_sent: None,
            running: false,
            drain: DrainTracker::new(),
            dispatch: DispatchTable::new(),
            timeout_notifier: None,
            watchdog,
            link_closed: false,
            encoder: Box::new(encoder),
            transport: Box::new(transport),
            clock: Box::new(clock),
            stats: SchedulerStats::default(),
        }
    }

    /// Replace the clock. The watchdog restarts from the new clock's time.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.watchdog = Watchdog::new(self.config.watchdog_timeout(), clock.now());
        self.clock = Box::new(clock);
        self
    }

    /// Install the device-logic dispatch table.
    pub fn with_dispatch(mut self, dispatch: DispatchTable<D>) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Install the callback run whenever a wait is exhausted.
    pub fn with_wait_timeout_notifier<F>(mut self, notifier: F) -> Self
    where
        F: FnMut(&mut D, Option<&Frame>) + 'static,
    {
        self.timeout_notifier = Some(Box::new(notifier));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> &D {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut D {
        &mut self.state
    }

    pub fn into_state(self) -> D {
        self.state
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// The queued commands.
    pub fn queue(&self) -> &CommandQueue<D> {
        &self.queue
    }

    /// The expectation currently stalling the queue.
    pub fn pending_wait(&self) -> Option<&WaitSpec<D>> {
        self.pending.as_ref().map(|p| &p.spec)
    }

    /// State of the most recent wait.
    pub fn last_wait_state(&self) -> Option<WaitState> {
        self.last_wait_state
    }

    /// The most recently transmitted frame.
    pub fn last_sent(&self) -> Option<&Frame> {
        self.last_sent.as_ref()
    }

    /// Whether the run loop is executing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Nothing queued and nothing awaited.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.pending.is_none()
    }

    /// Whether the watchdog has closed the transport.
    pub fn is_link_closed(&self) -> bool {
        self.link_closed
    }

    /// Whether a drain cycle is running.
    pub fn drain_in_progress(&self) -> bool {
        self.drain.in_progress()
    }

    // ========================================================================
    // Enqueueing
    // ========================================================================

    /// Queue a batch by priority and run the queue if it is not running.
    pub fn enqueue(&mut self, batch: impl Into<Batch<D>>) -> Result<()> {
        let batch = batch.into();
        let count = batch.len();
        let index = self.queue.enqueue(batch)?;
        log_if!(self.config.debug.flow, "enqueue: {} command(s) at {}", count, index);
        self.dump_queue("enqueue");
        self.run()
    }

    /// Queue a batch ahead of its peers and run the queue if it is not
    /// running.
    pub fn enqueue_front(&mut self, batch: impl Into<Batch<D>>) -> Result<()> {
        let batch = batch.into();
        let count = batch.len();
        let index = self.queue.enqueue_front(batch)?;
        log_if!(
            self.config.debug.flow,
            "enqueue_front: {} command(s) at {}",
            count,
            index
        );
        self.dump_queue("enqueue_front");
        self.run()
    }

    fn dump_queue(&self, label: &str) {
        if !self.config.debug.flow {
            return;
        }
        info!("----- {} ({} queued) -----", label, self.queue.len());
        for line in self.queue.dump() {
            info!("| {}", line);
        }
    }

    /// Queue a send followed by its wait, ahead of their peers.
    pub fn send_and_wait_at_front(
        &mut self,
        frame: Frame,
        spec: WaitSpec<D>,
        priority: Option<i32>,
    ) -> Result<()> {
        self.enqueue_front(send_and_wait(frame, spec, priority))
    }

    // ========================================================================
    // Run loop
    // ========================================================================

    /// Execute queued commands until the queue is empty or a wait stalls it.
    ///
    /// Calls made while the loop is already running return immediately; the
    /// active loop picks up whatever was queued.
    pub fn run(&mut self) -> Result<()> {
        if self.running {
            trace!("run: already running");
            return Ok(());
        }
        self.running = true;
        let result = self.run_loop();
        self.running = false;
        gauge!(metric_defs::QUEUE_DEPTH.name).set(self.queue.len() as f64);
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.pending.is_none() {
            let Some(command) = self.queue.pop_front() else {
                log_if!(self.config.debug.flow, "run: queue empty");
                return Ok(());
            };
            let (kind, priority) = command.into_parts();
            match kind {
                CommandKind::SendFrame(frame) => self.transmit(frame)?,
                CommandKind::WaitFrame(spec) => self.begin_wait(spec, priority),
                CommandKind::Exec(exec) => {
                    log_if!(self.config.debug.frame_detail, "EXEC: {}", exec.label);
                    let result = (exec.func)(self);
                    self.absorb(&exec.label, result)?;
                }
                CommandKind::ResolveProperty(property) => {
                    let mut property = property.borrow_mut();
                    let resolved = property.resolve();
                    log_if!(
                        self.config.debug.frame_detail,
                        "RESOLVE_SET_PROPERTY: {} ({})",
                        property.name(),
                        if resolved { "resolved" } else { "nothing deferred" }
                    );
                }
            }
        }
        log_if!(
            self.config.debug.flow,
            "run: stalled on wait, {} command(s) queued",
            self.queue.len()
        );
        Ok(())
    }

    fn transmit(&mut self, frame: Frame) -> Result<()> {
        let label = if frame.resend { "Resent" } else { "Sent" };
        log_if!(self.config.debug.frames, "{}: {}", label, frame);

        let bytes = self.encoder.encode(&frame)?;
        if self.config.debug.raw_frames {
            info!("{} raw: {:02x?}", label, bytes);
        }
        self.transport.send(&bytes)?;

        self.stats.frames_sent += 1;
        counter!(metric_defs::FRAMES_SENT.name).increment(1);
        if frame.resend {
            self.stats.frames_resent += 1;
            counter!(metric_defs::FRAMES_RESENT.name).increment(1);
        }

        self.watchdog.kick(self.clock.now());
        self.last_sent = Some(frame);
        Ok(())
    }

    fn begin_wait(&mut self, mut spec: WaitSpec<D>, priority: Option<i32>) {
        spec.apply_defaults(self.config.wait_retry_max);
        let now = self.clock.now();
        log_if!(
            self.config.debug.frame_detail,
            "WAIT_FRAME {:?} timeout {}ms",
            spec,
            self.config.wait_timeout_ms
        );
        self.pending = Some(PendingWait {
            spec,
            priority,
            started: now,
            deadline: now + self.config.wait_timeout(),
        });
        self.last_wait_state = Some(WaitState::Active);
    }

    /// Report a non-fatal error and carry on; hand fatal ones back.
    fn absorb(&self, context: &str, result: Result<()>) -> Result<()> {
        match result {
            Err(e) if !e.is_fatal() => {
                warn!("{}: {}", context, e);
                Ok(())
            }
            other => other,
        }
    }

    // ========================================================================
    // Inbound frames
    // ========================================================================

    /// Process a frame received from the device.
    ///
    /// The frame goes to device logic first, then is checked against the
    /// pending wait. Drain flags on the frame queue a read of the device's
    /// buffered indication or confirm. The queue is held until all three
    /// steps are done, so a drain read goes out ahead of any work the
    /// handlers or the match callback queued.
    pub fn on_frame(&mut self, mut frame: Frame) -> Result<()> {
        frame.received = true;
        self.stats.frames_received += 1;
        counter!(metric_defs::FRAMES_RECEIVED.name).increment(1);

        if let Some(extra) = self.pending.as_ref().and_then(|p| p.spec.extra()) {
            frame.extra_params = Some(extra.clone());
        }

        // Work queued by handlers and callbacks must not run before a drain
        // triggered by this frame is queued.
        let was_running = std::mem::replace(&mut self.running, true);
        let result = self.handle_frame(&frame);
        self.running = was_running;
        result?;
        self.run()
    }

    fn handle_frame(&mut self, frame: &Frame) -> Result<()> {
        log_if!(self.config.debug.frame_parsing, "Rcvd (before dispatch): {}", frame);
        self.dispatch_frame(frame)?;
        log_if!(self.config.debug.frames, "Rcvd: {}", frame);

        if self.drain.complete(frame.frame_type) {
            debug!("drain: {} read", frame.frame_type);
        }

        self.match_pending(frame)?;
        self.start_drain(frame)
    }

    fn dispatch_frame(&mut self, frame: &Frame) -> Result<()> {
        match self.dispatch.route(frame) {
            Route::Frame(handler) => {
                let result = handler(self, frame);
                self.absorb(frame.frame_type.name(), result)
            }
            Route::Zdo(cluster, handler) => {
                trace!("ZDO dispatch: {}", cluster);
                let result = handler(self, frame);
                self.absorb(frame.frame_type.name(), result)
            }
            Route::UnhandledCluster(cluster_id) => {
                debug!("No handler for ZDO cluster: {:?}", cluster_id);
                Ok(())
            }
            Route::Unhandled => {
                trace!("No handler for {}", frame.frame_type);
                Ok(())
            }
        }
    }

    fn match_pending(&mut self, frame: &Frame) -> Result<()> {
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };
        if on_wait_frame(&pending.spec, frame) != WaitState::Matched {
            log_if!(
                self.config.debug.frame_detail,
                "Wait NOT satisfied: {:?}",
                pending.spec
            );
            self.pending = Some(pending);
            return Ok(());
        }

        log_if!(self.config.debug.frame_detail, "Wait satisfied: {:?}", pending.spec);
        self.last_wait_state = Some(WaitState::Matched);
        self.stats.waits_matched += 1;
        counter!(metric_defs::WAIT_MATCHED.name).increment(1);
        let elapsed = self.clock.now().saturating_duration_since(pending.started);
        histogram!(metric_defs::WAIT_LATENCY.name).record(elapsed.as_secs_f64());

        if let Some(callback) = pending.spec.take_on_match() {
            let result = callback(self, frame);
            self.absorb("wait match callback", result)?;
        }
        Ok(())
    }

    fn start_drain(&mut self, frame: &Frame) -> Result<()> {
        if self.drain.in_progress() {
            return Ok(());
        }
        let types = DrainTracker::requested(frame);
        if types.is_empty() {
            return Ok(());
        }
        debug!("drain: device signalled {:?}", types);
        self.drain.begin(&types);
        self.stats.drains_injected += 1;
        counter!(metric_defs::DRAIN_INJECTED.name).increment(1);
        self.enqueue_front(drain_commands(&types))
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// The earliest instant at which [`poll_timers`](Self::poll_timers) has
    /// work to do.
    /// `None` once the link is closed.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.link_closed {
            return None;
        }
        let wait = self.pending.as_ref().map(|p| p.deadline);
        wait.into_iter().chain(self.watchdog.deadline()).min()
    }

    /// Fire any timer whose deadline has passed.
    pub fn poll_timers(&mut self) -> Result<()> {
        let now = self.clock.now();
        if !self.link_closed && self.watchdog.poll(now) {
            self.watchdog_expired();
        }
        if self.link_closed {
            return Ok(());
        }
        if self.pending.as_ref().is_some_and(|p| p.is_expired(now)) {
            self.wait_timed_out()?;
        }
        Ok(())
    }

    fn watchdog_expired(&mut self) {
        warn!(
            "Watchdog expired: nothing sent for {:?}, closing transport",
            self.watchdog.timeout()
        );
        self.transport.close();
        self.link_closed = true;
        self.stats.watchdog_trips += 1;
        counter!(metric_defs::WATCHDOG_TRIPPED.name).increment(1);
    }

    fn wait_timed_out(&mut self) -> Result<()> {
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };
        let count = pending.spec.attempt().unwrap_or(1);
        let max = pending.spec.ceiling().unwrap_or(self.config.wait_retry_max);
        let action = on_wait_expired(count, max);
        self.last_wait_state = Some(action.state());

        match action {
            TimeoutAction::Resend { attempt, max } => {
                log_if!(
                    self.config.debug.frame_detail,
                    "Wait timed out, resending ({}/{}): {:?}",
                    attempt,
                    max,
                    pending.spec
                );
                self.stats.wait_retries += 1;
                counter!(metric_defs::WAIT_RETRIED.name).increment(1);

                pending.spec.set_attempt(attempt);
                let mut batch = Vec::with_capacity(2);
                if let Some(frame) = self.last_sent.as_mut() {
                    frame.resend = true;
                    batch.push(Command::new(CommandKind::SendFrame(frame.clone()), pending.priority));
                }
                batch.push(Command::new(CommandKind::WaitFrame(pending.spec), pending.priority));
                self.enqueue_front(batch)
            }
            TimeoutAction::Exhaust { attempts } => {
                warn!(
                    "Wait exhausted after {} attempt(s): {:?}",
                    attempts, pending.spec
                );
                self.stats.waits_exhausted += 1;
                counter!(metric_defs::WAIT_EXHAUSTED.name).increment(1);

                if let Some(frame_type) = pending.spec.frame_type() {
                    if self.drain.complete(frame_type) {
                        debug!("drain: giving up on {}", frame_type);
                    }
                }
                if let Some(callback) = pending.spec.take_on_timeout() {
                    let result = callback(self);
                    self.absorb("wait timeout callback", result)?;
                }
                if let Some(notifier) = self.timeout_notifier.as_mut() {
                    notifier(&mut self.state, self.last_sent.as_ref());
                }
                self.run()
            }
        }
    }
}

impl<D> std::fmt::Debug for Scheduler<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("queued", &self.queue.len())
            .field("pending", &self.pending.as_ref().map(|p| &p.spec))
            .field("running", &self.running)
            .field("link_closed", &self.link_closed)
            .field("stats", &self.stats)
            .finish()
    }
}
