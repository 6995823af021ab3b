//! Probe session: the device logic driven by the host.
//!
//! A run reads the configured network parameters one after another, prints
//! them, applies any configured writes, optionally asks for the firmware
//! version, and optionally walks the coordinator's neighbour table page by
//! page. All of it is expressed as queued commands; [`ProbeSession`] is the
//! state those commands and their callbacks share.

use std::collections::BTreeMap;

use ::metrics::gauge;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use zbhost_core::{
    send_and_wait, Command, DispatchTable, Property, Result, Scheduler, SchedulerError, WaitSpec,
};
use zbhost_frame::{
    FieldValue, Frame, FrameType, ZdoCluster, FIELD_CLUSTER_ID, FIELD_ID, FIELD_PARAM_ID,
    FIELD_PROFILE_ID, FIELD_STATUS, FIELD_VALUE, ZDO_PROFILE_ID,
};

use crate::metrics::metric_defs;
use crate::{ParamId, ParamWrite, RunnerConfig};

/// Field carrying the first neighbour-table entry of an LQI page.
pub const FIELD_START_INDEX: &str = "start_index";
/// Field carrying the size of the whole neighbour table.
pub const FIELD_NUM_ENTRIES: &str = "num_entries";
/// Field carrying the neighbour entries of an LQI page.
pub const FIELD_NEIGHBORS: &str = "neighbors";
/// Field carrying the firmware version.
pub const FIELD_VERSION: &str = "version";

/// Short address of the coordinator.
const COORDINATOR_ADDR16: &str = "0000";

// ============================================================================
// Session state
// ============================================================================

/// One entry of a neighbour table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub addr64: String,
    pub addr16: String,
    pub lqi: u8,
}

impl Neighbor {
    /// Parse an `[addr64, addr16, lqi]` entry.
    pub fn from_field(value: &FieldValue) -> Option<Self> {
        let [addr64, addr16, lqi] = value.as_list()? else {
            return None;
        };
        Some(Neighbor {
            addr64: addr64.as_str()?.to_string(),
            addr16: addr16.as_str()?.to_string(),
            lqi: lqi.as_int()?,
        })
    }
}

impl std::fmt::Display for Neighbor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} lqi={}", self.addr64, self.addr16, self.lqi)
    }
}

/// Outcome of a configured parameter write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The device accepted the value.
    Confirmed(FieldValue),
    /// The device rejected the write or never answered.
    Failed,
}

/// State shared by the probe's commands and handlers.
#[derive(Debug, Default)]
pub struct ProbeSession {
    params: Vec<ParamId>,
    param_idx: usize,
    values: BTreeMap<ParamId, FieldValue>,
    writes: Vec<ParamWrite>,
    pending_writes: Vec<(ParamId, oneshot::Receiver<FieldValue>)>,
    write_outcomes: BTreeMap<ParamId, WriteOutcome>,
    query_version: bool,
    version: Option<u32>,
    scan: bool,
    scan_in_progress: bool,
    neighbors: Vec<Neighbor>,
    next_start_index: Option<u8>,
    wait_timeouts: u32,
    last_timeout: Option<Frame>,
    next_frame_id: u8,
}

impl ProbeSession {
    /// Create the session a configuration asks for.
    pub fn new(config: &RunnerConfig) -> Self {
        ProbeSession {
            params: config.parameters.clone(),
            writes: config.writes.clone(),
            query_version: config.query_version,
            scan: config.scan,
            ..Default::default()
        }
    }

    /// Parameter values read or written so far.
    pub fn values(&self) -> &BTreeMap<ParamId, FieldValue> {
        &self.values
    }

    /// Value of one parameter.
    pub fn value(&self, param: ParamId) -> Option<&FieldValue> {
        self.values.get(&param)
    }

    /// Result of each configured write, once known.
    pub fn write_outcomes(&self) -> &BTreeMap<ParamId, WriteOutcome> {
        &self.write_outcomes
    }

    /// Firmware version, if queried.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Neighbours discovered by the scan.
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Whether a neighbour-table walk is still running.
    pub fn scan_in_progress(&self) -> bool {
        self.scan_in_progress
    }

    /// Number of waits that ran out of attempts.
    pub fn wait_timeouts(&self) -> u32 {
        self.wait_timeouts
    }

    /// The frame whose wait last ran out of attempts.
    pub fn last_timeout(&self) -> Option<&Frame> {
        self.last_timeout.as_ref()
    }

    /// Lines printed by the parameter dump.
    pub fn parameter_report(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|param| {
                let value = match (param, self.values.get(param)) {
                    (ParamId::ScanChannels, Some(FieldValue::Integer(mask))) => {
                        format!("0x{:08X}", mask)
                    }
                    (_, Some(value)) => value.to_string(),
                    (_, None) => "-".to_string(),
                };
                format!("{:>20}: {}", param.label(), value)
            })
            .collect()
    }

    fn take_frame_id(&mut self) -> u8 {
        self.next_frame_id = self.next_frame_id.wrapping_add(1).max(1);
        self.next_frame_id
    }

    fn add_neighbor(&mut self, neighbor: Neighbor) {
        match self.neighbors.iter_mut().find(|n| n.addr64 == neighbor.addr64) {
            Some(known) => *known = neighbor,
            None => {
                info!("Added neighbor {}", neighbor.addr64);
                self.neighbors.push(neighbor);
            }
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Device-logic handlers for unsolicited frames.
pub fn dispatch_table() -> DispatchTable<ProbeSession> {
    DispatchTable::new()
        .on_frame(FrameType::DeviceStateChanged, handle_device_state_changed)
        .on_zdo(ZdoCluster::ManagementLqiResponse, handle_lqi_response)
}

/// Timeout notifier: counts exhausted waits and abandons a running scan.
pub fn note_wait_timeout(session: &mut ProbeSession, last_sent: Option<&Frame>) {
    session.wait_timeouts += 1;
    session.last_timeout = last_sent.cloned();
    match last_sent {
        Some(frame) => warn!("No response to {}", frame),
        None => warn!("Wait timed out before anything was sent"),
    }
    if session.scan_in_progress {
        warn!(
            "Abandoning neighbour scan after {} neighbour(s)",
            session.neighbors.len()
        );
        session.scan_in_progress = false;
        session.next_start_index = None;
    }
}

/// Commands for everything the session was configured to do.
pub fn startup_commands(session: &ProbeSession) -> Vec<Command<ProbeSession>> {
    let mut commands = Vec::new();
    if !session.params.is_empty() {
        commands.push(Command::exec("read_parameters", read_parameters));
        commands.push(Command::exec("dump_parameters", dump_parameters));
    }
    if !session.writes.is_empty() {
        commands.push(Command::exec("write_parameters", write_parameters));
    }
    if session.query_version {
        let wait = WaitSpec::for_type(FrameType::Version).on_match(store_version);
        commands.extend(send_and_wait(Frame::new(FrameType::Version), wait, None));
    }
    if session.scan {
        commands.push(Command::exec("scan", start_scan));
    }
    commands
}

/// Queue the session's start-up work.
pub fn start(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    let commands = startup_commands(sched.state());
    if commands.is_empty() {
        debug!("Nothing to do at start-up");
        return Ok(());
    }
    sched.enqueue(commands)
}

/// Whether the session has nothing left to do.
pub fn is_finished(sched: &Scheduler<ProbeSession>) -> bool {
    sched.is_idle() && !sched.state().scan_in_progress
}

// ============================================================================
// Parameters
// ============================================================================

fn read_parameters(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    sched.state_mut().param_idx = 0;
    read_next_parameter(sched)
}

/// Read the next parameter; its completion reads the one after.
fn read_next_parameter(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    let session = sched.state_mut();
    let Some(&param) = session.params.get(session.param_idx) else {
        return Ok(());
    };
    session.param_idx += 1;

    let frame = Frame::new(FrameType::ReadParameter).with(FIELD_PARAM_ID, param.id());
    let wait = WaitSpec::for_type(FrameType::ReadParameter)
        .field(FIELD_PARAM_ID, param.id())
        .on_match(move |s: &mut Scheduler<ProbeSession>, frame: &Frame| {
            store_parameter(s.state_mut(), param, frame);
            read_next_parameter(s)
        })
        .on_timeout(read_next_parameter);
    sched.send_and_wait_at_front(frame, wait, None)
}

fn store_parameter(session: &mut ProbeSession, param: ParamId, frame: &Frame) {
    let status = frame.get_as::<u8>(FIELD_STATUS).unwrap_or(0);
    if status != 0 {
        warn!("Reading {} failed with status 0x{:02X}", param, status);
        return;
    }
    match frame.get(FIELD_VALUE) {
        Some(value) => {
            debug!("{} = {}", param, value);
            session.values.insert(param, value.clone());
        }
        None => warn!("Response for {} carries no value", param),
    }
}

fn dump_parameters(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    for line in sched.state().parameter_report() {
        info!("{}", line);
    }
    Ok(())
}

/// Queue every configured write, each completed through a deferred
/// property, followed by a check of the outcomes.
fn write_parameters(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    let writes = sched.state().writes.clone();
    let mut batch = Vec::with_capacity(writes.len() * 3 + 1);

    for write in writes {
        let param = write.param;
        let property = Property::new(param.label(), write.value.clone()).into_handle();
        let completion = property.borrow_mut().defer_set();
        sched.state_mut().pending_writes.push((param, completion));

        let frame = Frame::new(FrameType::WriteParameter)
            .with(FIELD_PARAM_ID, param.id())
            .with(FIELD_VALUE, write.value);
        let rejected = property.clone();
        let lost = property.clone();
        let wait = WaitSpec::for_type(FrameType::WriteParameter)
            .field(FIELD_PARAM_ID, param.id())
            .on_match(move |_: &mut Scheduler<ProbeSession>, frame: &Frame| {
                let status = frame.get_as::<u8>(FIELD_STATUS).unwrap_or(0);
                if status == 0 {
                    return Ok(());
                }
                rejected.borrow_mut().set_value(FieldValue::Null);
                Err(SchedulerError::handler(format!(
                    "write of {} rejected with status 0x{:02X}",
                    param, status
                )))
            })
            .on_timeout(move |_: &mut Scheduler<ProbeSession>| {
                lost.borrow_mut().set_value(FieldValue::Null);
                Ok(())
            });

        batch.extend(send_and_wait(frame, wait, None));
        batch.push(Command::resolve(property));
    }
    batch.push(Command::exec("confirm_writes", confirm_writes));
    sched.enqueue_front(batch)
}

fn confirm_writes(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    let session = sched.state_mut();
    for (param, mut completion) in std::mem::take(&mut session.pending_writes) {
        let outcome = match completion.try_recv() {
            Ok(FieldValue::Null) | Err(_) => {
                warn!("Write of {} did not complete", param);
                WriteOutcome::Failed
            }
            Ok(value) => {
                info!("Wrote {} = {}", param, value);
                session.values.insert(param, value.clone());
                WriteOutcome::Confirmed(value)
            }
        };
        session.write_outcomes.insert(param, outcome);
    }
    Ok(())
}

// ============================================================================
// Version
// ============================================================================

fn store_version(sched: &mut Scheduler<ProbeSession>, frame: &Frame) -> Result<()> {
    let version = frame
        .get_as::<u32>(FIELD_VERSION)
        .ok_or_else(|| SchedulerError::handler("VERSION response without a version"))?;
    info!("Firmware version 0x{:08X}", version);
    sched.state_mut().version = Some(version);
    Ok(())
}

// ============================================================================
// Neighbour scan
// ============================================================================

fn start_scan(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    let session = sched.state_mut();
    session.scan_in_progress = true;
    session.next_start_index = None;
    session.neighbors.clear();
    gauge!(metric_defs::SCAN_NEIGHBORS.name).set(0.0);
    request_lqi_page(sched, 0)
}

/// Ask the coordinator for one page of its neighbour table.
fn request_lqi_page(sched: &mut Scheduler<ProbeSession>, start_index: u8) -> Result<()> {
    let session = sched.state_mut();
    let id = session.take_frame_id();
    let mut frame = Frame::new(FrameType::ApsDataRequest)
        .with(FIELD_ID, id)
        .with("destination16", COORDINATOR_ADDR16)
        .with(FIELD_PROFILE_ID, ZDO_PROFILE_ID)
        .with(FIELD_CLUSTER_ID, ZdoCluster::ManagementLqiRequest.id())
        .with(FIELD_START_INDEX, start_index);
    if let Some(mac) = session.values.get(&ParamId::MacAddress) {
        frame.set("destination64", mac.clone());
    }
    debug!("Requesting neighbour table from index {}", start_index);

    let wait = WaitSpec::for_type(FrameType::ApsDataRequest).field(FIELD_ID, id);
    sched.send_and_wait_at_front(frame, wait, None)
}

fn handle_lqi_response(sched: &mut Scheduler<ProbeSession>, frame: &Frame) -> Result<()> {
    if !sched.state().scan_in_progress {
        debug!("Ignoring unsolicited neighbour table page");
        return Ok(());
    }
    let start_index = frame
        .get_as::<u8>(FIELD_START_INDEX)
        .ok_or_else(|| SchedulerError::handler("LQI response without start_index"))?;
    let num_entries = frame
        .get_as::<u8>(FIELD_NUM_ENTRIES)
        .ok_or_else(|| SchedulerError::handler("LQI response without num_entries"))?;
    let entries = frame
        .get(FIELD_NEIGHBORS)
        .and_then(FieldValue::as_list)
        .unwrap_or(&[]);

    let session = sched.state_mut();
    for entry in entries {
        match Neighbor::from_field(entry) {
            Some(neighbor) => session.add_neighbor(neighbor),
            None => warn!("Malformed neighbour entry {}", entry),
        }
    }
    gauge!(metric_defs::SCAN_NEIGHBORS.name).set(session.neighbors.len() as f64);

    let next = start_index as usize + entries.len();
    session.next_start_index = if !entries.is_empty() && next < num_entries as usize {
        Some(next as u8)
    } else {
        None
    };
    sched.enqueue_front(Command::exec("lqi_next", lqi_next))
}

/// Continue the walk, or finish it when the last page has been read.
fn lqi_next(sched: &mut Scheduler<ProbeSession>) -> Result<()> {
    if !sched.state().scan_in_progress {
        return Ok(());
    }
    if let Some(start_index) = sched.state_mut().next_start_index.take() {
        return request_lqi_page(sched, start_index);
    }

    let session = sched.state_mut();
    session.scan_in_progress = false;
    info!("Scan complete: {} neighbour(s)", session.neighbors.len());
    for neighbor in &session.neighbors {
        info!("  {}", neighbor);
    }
    Ok(())
}

fn handle_device_state_changed(_: &mut Scheduler<ProbeSession>, frame: &Frame) -> Result<()> {
    debug!("Device state changed: {}", frame);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_core::{ManualClock, MemoryTransport, SchedulerConfig};
    use zbhost_frame::JsonLineCodec;

    fn session_with(config: RunnerConfig) -> (Scheduler<ProbeSession>, MemoryTransport) {
        let transport = MemoryTransport::new();
        let sched = Scheduler::new(
            SchedulerConfig::default(),
            ProbeSession::new(&config),
            JsonLineCodec::new(),
            transport.clone(),
        )
        .with_clock(ManualClock::new())
        .with_dispatch(dispatch_table())
        .with_wait_timeout_notifier(note_wait_timeout);
        (sched, transport)
    }

    fn last_sent(transport: &MemoryTransport) -> Frame {
        let sent = transport.sent();
        let bytes = sent.last().expect("nothing sent");
        serde_json::from_slice(bytes).expect("valid frame")
    }

    fn read_response(param: ParamId, value: impl Into<FieldValue>) -> Frame {
        Frame::new(FrameType::ReadParameter)
            .with(FIELD_PARAM_ID, param.id())
            .with(FIELD_STATUS, 0u8)
            .with(FIELD_VALUE, value)
    }

    fn lqi_page(start: u8, total: u8, entries: Vec<FieldValue>) -> Frame {
        Frame::new(FrameType::ApsDataIndication)
            .with(FIELD_PROFILE_ID, ZDO_PROFILE_ID)
            .with(FIELD_CLUSTER_ID, ZdoCluster::ManagementLqiResponse.id())
            .with(FIELD_START_INDEX, start)
            .with(FIELD_NUM_ENTRIES, total)
            .with(FIELD_NEIGHBORS, FieldValue::List(entries))
    }

    fn entry(addr64: &str, addr16: &str, lqi: u8) -> FieldValue {
        FieldValue::List(vec![addr64.into(), addr16.into(), lqi.into()])
    }

    #[test]
    fn test_parameters_read_in_order() {
        let config = RunnerConfig {
            parameters: vec![ParamId::MacAddress, ParamId::ScanChannels],
            ..Default::default()
        };
        let (mut sched, transport) = session_with(config);
        start(&mut sched).unwrap();

        assert_eq!(last_sent(&transport).get_as::<u8>(FIELD_PARAM_ID), Some(0x01));
        sched
            .on_frame(read_response(ParamId::MacAddress, "00:21:2e:ff:ff:00:aa:bb"))
            .unwrap();
        assert_eq!(last_sent(&transport).get_as::<u8>(FIELD_PARAM_ID), Some(0x0A));
        sched
            .on_frame(read_response(ParamId::ScanChannels, 0x0210_8800u32))
            .unwrap();

        assert!(is_finished(&sched));
        let report = sched.state().parameter_report();
        assert_eq!(report[0], "         mac_address: 00:21:2e:ff:ff:00:aa:bb");
        assert_eq!(report[1], "       scan_channels: 0x02108800");
    }

    #[test]
    fn test_failed_read_leaves_gap() {
        let config = RunnerConfig {
            parameters: vec![ParamId::OperatingChannel],
            ..Default::default()
        };
        let (mut sched, _transport) = session_with(config);
        start(&mut sched).unwrap();
        sched
            .on_frame(
                Frame::new(FrameType::ReadParameter)
                    .with(FIELD_PARAM_ID, ParamId::OperatingChannel.id())
                    .with(FIELD_STATUS, 1u8),
            )
            .unwrap();
        assert!(sched.state().value(ParamId::OperatingChannel).is_none());
        assert!(sched.state().parameter_report()[0].ends_with(": -"));
    }

    #[test]
    fn test_writes_resolve_through_properties() {
        let config = RunnerConfig {
            parameters: vec![],
            writes: vec![
                ParamWrite {
                    param: ParamId::NetworkUpdateId,
                    value: FieldValue::Integer(2),
                },
                ParamWrite {
                    param: ParamId::OperatingChannel,
                    value: FieldValue::Integer(20),
                },
            ],
            ..Default::default()
        };
        let (mut sched, transport) = session_with(config);
        start(&mut sched).unwrap();

        let sent = last_sent(&transport);
        assert_eq!(sent.frame_type, FrameType::WriteParameter);
        assert_eq!(sent.get(FIELD_VALUE), Some(&FieldValue::Integer(2)));
        sched
            .on_frame(
                Frame::new(FrameType::WriteParameter)
                    .with(FIELD_PARAM_ID, ParamId::NetworkUpdateId.id())
                    .with(FIELD_STATUS, 0u8),
            )
            .unwrap();
        sched
            .on_frame(
                Frame::new(FrameType::WriteParameter)
                    .with(FIELD_PARAM_ID, ParamId::OperatingChannel.id())
                    .with(FIELD_STATUS, 0x82u8),
            )
            .unwrap();

        assert!(is_finished(&sched));
        let outcomes = sched.state().write_outcomes();
        assert_eq!(
            outcomes.get(&ParamId::NetworkUpdateId),
            Some(&WriteOutcome::Confirmed(FieldValue::Integer(2)))
        );
        assert_eq!(
            outcomes.get(&ParamId::OperatingChannel),
            Some(&WriteOutcome::Failed)
        );
        assert_eq!(
            sched.state().value(ParamId::NetworkUpdateId),
            Some(&FieldValue::Integer(2))
        );
    }

    #[test]
    fn test_version_query() {
        let config = RunnerConfig {
            parameters: vec![],
            query_version: true,
            ..Default::default()
        };
        let (mut sched, transport) = session_with(config);
        start(&mut sched).unwrap();
        assert_eq!(last_sent(&transport).frame_type, FrameType::Version);

        sched
            .on_frame(Frame::new(FrameType::Version).with(FIELD_VERSION, 0x2670_0500u32))
            .unwrap();
        assert_eq!(sched.state().version(), Some(0x2670_0500));
    }

    #[test]
    fn test_scan_walks_pages() {
        let config = RunnerConfig {
            parameters: vec![],
            scan: true,
            ..Default::default()
        };
        let (mut sched, transport) = session_with(config);
        start(&mut sched).unwrap();

        let request = last_sent(&transport);
        assert_eq!(request.frame_type, FrameType::ApsDataRequest);
        assert_eq!(request.get_as::<u8>(FIELD_START_INDEX), Some(0));
        let id: u8 = request.get_as(FIELD_ID).unwrap();
        sched
            .on_frame(Frame::new(FrameType::ApsDataRequest).with(FIELD_ID, id))
            .unwrap();
        assert!(sched.state().scan_in_progress());
        assert!(!is_finished(&sched));

        sched
            .on_frame(lqi_page(
                0,
                3,
                vec![entry("00:0d:6f:00:0a:90:69:e1", "5bbe", 200), entry("00:0d:6f:00:0b:12:34:56", "1f2e", 150)],
            ))
            .unwrap();
        let request = last_sent(&transport);
        assert_eq!(request.get_as::<u8>(FIELD_START_INDEX), Some(2));
        let id: u8 = request.get_as(FIELD_ID).unwrap();
        sched
            .on_frame(Frame::new(FrameType::ApsDataRequest).with(FIELD_ID, id))
            .unwrap();
        sched
            .on_frame(lqi_page(2, 3, vec![entry("00:0d:6f:00:0c:aa:bb:cc", "0a0b", 90)]))
            .unwrap();

        assert!(!sched.state().scan_in_progress());
        assert!(is_finished(&sched));
        assert_eq!(sched.state().neighbors().len(), 3);
        assert_eq!(sched.state().neighbors()[2].lqi, 90);
    }

    #[test]
    fn test_next_page_requested_ahead_of_queued_work() {
        let config = RunnerConfig {
            parameters: vec![],
            scan: true,
            ..Default::default()
        };
        let (mut sched, transport) = session_with(config);
        start(&mut sched).unwrap();
        let id: u8 = last_sent(&transport).get_as(FIELD_ID).unwrap();
        sched
            .on_frame(Frame::new(FrameType::ApsDataRequest).with(FIELD_ID, id))
            .unwrap();

        sched
            .enqueue(vec![
                Command::send(Frame::new(FrameType::Version)),
                Command::wait(WaitSpec::for_type(FrameType::Version)),
                Command::send(Frame::new(FrameType::ReadParameter).with(FIELD_PARAM_ID, 0x01u8)),
            ])
            .unwrap();
        sched
            .on_frame(lqi_page(0, 3, vec![entry("00:0d:6f:00:0a:90:69:e1", "5bbe", 200)]))
            .unwrap();
        assert_eq!(last_sent(&transport).frame_type, FrameType::Version);

        sched
            .on_frame(Frame::new(FrameType::Version).with(FIELD_VERSION, 0x2670_0500u32))
            .unwrap();
        let request = last_sent(&transport);
        assert_eq!(request.frame_type, FrameType::ApsDataRequest);
        assert_eq!(request.get_as::<u8>(FIELD_START_INDEX), Some(1));
    }

    #[test]
    fn test_unsolicited_page_ignored() {
        let (mut sched, _transport) = session_with(RunnerConfig {
            parameters: vec![],
            ..Default::default()
        });
        sched
            .on_frame(lqi_page(0, 1, vec![entry("00:0d:6f:00:0a:90:69:e1", "5bbe", 200)]))
            .unwrap();
        assert!(sched.state().neighbors().is_empty());
        assert!(is_finished(&sched));
    }

    #[test]
    fn test_notifier_counts_and_abandons_scan() {
        let mut session = ProbeSession {
            scan_in_progress: true,
            ..Default::default()
        };
        let frame = Frame::new(FrameType::ApsDataRequest).with(FIELD_ID, 1u8);
        note_wait_timeout(&mut session, Some(&frame));
        assert_eq!(session.wait_timeouts(), 1);
        assert_eq!(session.last_timeout(), Some(&frame));
        assert!(!session.scan_in_progress());
    }

    #[test]
    fn test_neighbor_parsing() {
        assert_eq!(
            Neighbor::from_field(&entry("00:0d:6f:00:0a:90:69:e1", "5bbe", 200)),
            Some(Neighbor {
                addr64: "00:0d:6f:00:0a:90:69:e1".into(),
                addr16: "5bbe".into(),
                lqi: 200,
            })
        );
        assert_eq!(Neighbor::from_field(&FieldValue::Integer(3)), None);
        assert_eq!(
            Neighbor::from_field(&FieldValue::List(vec!["a".into(), "b".into()])),
            None
        );
    }

    #[test]
    fn test_frame_ids_skip_zero() {
        let mut session = ProbeSession {
            next_frame_id: u8::MAX,
            ..Default::default()
        };
        assert_eq!(session.take_frame_id(), 1);
        assert_eq!(session.take_frame_id(), 2);
    }
}
