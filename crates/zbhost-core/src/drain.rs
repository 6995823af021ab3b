//! Device-buffer draining.
//!
//! The device sets `data_indication` or `data_confirm` on an inbound frame
//! when it holds an APS indication or confirm the host has not read yet. The
//! host answers by reading it: a send/wait pair per flagged type, pushed to
//! the very front of the queue. When both flags are set both pairs go in a
//! single batch, indication first. The tracker remembers which types are
//! outstanding so that a second signal does not start another drain while
//! one is still running.

use zbhost_frame::{Frame, FrameType, FIELD_DATA_CONFIRM, FIELD_DATA_INDICATION};

use crate::{send_and_wait, Command, WaitSpec};

/// Priority of injected drain commands; ahead of everything else.
pub const DRAIN_PRIORITY: i32 = i32::MIN;

/// Outstanding drain reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainTracker {
    outstanding: Vec<FrameType>,
}

impl DrainTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The types `frame` asks the host to read, indication first.
    pub fn requested(frame: &Frame) -> Vec<FrameType> {
        let mut types = Vec::with_capacity(2);
        if frame.flag(FIELD_DATA_INDICATION) {
            types.push(FrameType::ApsDataIndication);
        }
        if frame.flag(FIELD_DATA_CONFIRM) {
            types.push(FrameType::ApsDataConfirm);
        }
        types
    }

    /// Whether a drain cycle is running.
    pub fn in_progress(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Types still waiting for their response.
    pub fn outstanding(&self) -> &[FrameType] {
        &self.outstanding
    }

    /// Start a drain cycle for `types`.
    pub fn begin(&mut self, types: &[FrameType]) {
        for t in types {
            if !self.outstanding.contains(t) {
                self.outstanding.push(*t);
            }
        }
    }

    /// Mark `frame_type` as answered or given up on.
    ///
    /// Returns `true` if it was outstanding.
    pub fn complete(&mut self, frame_type: FrameType) -> bool {
        let before = self.outstanding.len();
        self.outstanding.retain(|t| *t != frame_type);
        self.outstanding.len() != before
    }
}

/// The read commands for a drain of `types`.
pub fn drain_commands<D>(types: &[FrameType]) -> Vec<Command<D>> {
    types
        .iter()
        .flat_map(|t| send_and_wait(Frame::new(*t), WaitSpec::for_type(*t), Some(DRAIN_PRIORITY)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandKind;

    #[test]
    fn test_requested_reads() {
        let none = Frame::new(FrameType::DeviceState);
        let ind = Frame::new(FrameType::DeviceState).with(FIELD_DATA_INDICATION, true);
        let both = Frame::new(FrameType::DeviceState)
            .with(FIELD_DATA_CONFIRM, true)
            .with(FIELD_DATA_INDICATION, true);
        let off = Frame::new(FrameType::DeviceState).with(FIELD_DATA_CONFIRM, false);

        assert!(DrainTracker::requested(&none).is_empty());
        assert_eq!(DrainTracker::requested(&ind), vec![FrameType::ApsDataIndication]);
        assert_eq!(
            DrainTracker::requested(&both),
            vec![FrameType::ApsDataIndication, FrameType::ApsDataConfirm]
        );
        assert!(DrainTracker::requested(&off).is_empty());
    }

    #[test]
    fn test_cycle() {
        let mut tracker = DrainTracker::new();
        tracker.begin(&[FrameType::ApsDataIndication, FrameType::ApsDataConfirm]);
        assert!(tracker.in_progress());

        assert!(tracker.complete(FrameType::ApsDataIndication));
        assert!(!tracker.complete(FrameType::ApsDataIndication));
        assert!(tracker.in_progress());

        assert!(tracker.complete(FrameType::ApsDataConfirm));
        assert!(!tracker.in_progress());
    }

    #[test]
    fn test_drain_commands_pairs() {
        let cmds: Vec<Command<()>> =
            drain_commands(&[FrameType::ApsDataIndication, FrameType::ApsDataConfirm]);
        assert_eq!(cmds.len(), 4);
        assert!(cmds.iter().all(|c| c.priority() == Some(DRAIN_PRIORITY)));
        match (cmds[0].kind(), cmds[3].kind()) {
            (CommandKind::SendFrame(f), CommandKind::WaitFrame(w)) => {
                assert_eq!(f.frame_type, FrameType::ApsDataIndication);
                assert_eq!(w.frame_type(), Some(FrameType::ApsDataConfirm));
            }
            _ => panic!("unexpected command layout"),
        }
    }
}
