//! Commands and command batches.
//!
//! A [`Command`] is one step the scheduler performs: transmit a frame, wait
//! for a matching frame, run a host callback, or resolve a deferred property
//! write. Commands are always submitted as a [`Batch`]; every command in a
//! batch shares the priority of the batch's first command.

use std::fmt;

use zbhost_frame::Frame;

use crate::{PropertyHandle, QueueError, Result, Scheduler, WaitSpec};

/// A synchronous host step run inline by the scheduler.
pub type ExecFn<D> = Box<dyn FnOnce(&mut Scheduler<D>) -> Result<()>>;

/// Numeric command tags, as shown in queue dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    SendFrame,
    WaitFrame,
    Exec,
    ResolveProperty,
}

impl CommandTag {
    /// Numeric code of the tag.
    pub const fn code(self) -> u8 {
        match self {
            CommandTag::SendFrame => 0x01,
            CommandTag::WaitFrame => 0x02,
            CommandTag::Exec => 0x03,
            CommandTag::ResolveProperty => 0x04,
        }
    }

    /// Short label used in queue dumps.
    pub const fn label(self) -> &'static str {
        match self {
            CommandTag::SendFrame => "SEND",
            CommandTag::WaitFrame => "WAIT",
            CommandTag::Exec => "EXEC",
            CommandTag::ResolveProperty => "RESOLVE_SET_PROPERTY",
        }
    }
}

impl TryFrom<u8> for CommandTag {
    type Error = QueueError;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0x01 => Ok(CommandTag::SendFrame),
            0x02 => Ok(CommandTag::WaitFrame),
            0x03 => Ok(CommandTag::Exec),
            0x04 => Ok(CommandTag::ResolveProperty),
            other => Err(QueueError::UnknownTag(other)),
        }
    }
}

/// A labelled host callback.
pub struct Exec<D> {
    /// Name shown in logs and queue dumps.
    pub label: String,
    /// The callback itself.
    pub func: ExecFn<D>,
}

/// What a command does.
pub enum CommandKind<D> {
    /// Encode and transmit a frame.
    SendFrame(Frame),
    /// Install an expectation and stall until it is met or exhausted.
    WaitFrame(WaitSpec<D>),
    /// Run a host callback.
    Exec(Exec<D>),
    /// Fulfil a deferred property write.
    ResolveProperty(PropertyHandle),
}

/// One queued step, with its optional priority.
///
/// Lower priority values run first; commands without a priority run after
/// all prioritised ones.
pub struct Command<D> {
    kind: CommandKind<D>,
    priority: Option<i32>,
}

impl<D> Command<D> {
    pub(crate) fn new(kind: CommandKind<D>, priority: Option<i32>) -> Self {
        Command { kind, priority }
    }

    /// Transmit `frame`.
    pub fn send(frame: Frame) -> Self {
        Command::new(CommandKind::SendFrame(frame), None)
    }

    /// Wait for a frame matching `spec`.
    pub fn wait(spec: WaitSpec<D>) -> Self {
        Command::new(CommandKind::WaitFrame(spec), None)
    }

    /// Run `func` when the scheduler reaches this command.
    pub fn exec<F>(label: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(&mut Scheduler<D>) -> Result<()> + 'static,
    {
        Command::new(
            CommandKind::Exec(Exec {
                label: label.into(),
                func: Box::new(func),
            }),
            None,
        )
    }

    /// Resolve the deferred write of `property`.
    pub fn resolve(property: PropertyHandle) -> Self {
        Command::new(CommandKind::ResolveProperty(property), None)
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The priority, if any.
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: Option<i32>) {
        self.priority = priority;
    }

    /// The command's tag.
    pub fn tag(&self) -> CommandTag {
        match &self.kind {
            CommandKind::SendFrame(_) => CommandTag::SendFrame,
            CommandKind::WaitFrame(_) => CommandTag::WaitFrame,
            CommandKind::Exec(_) => CommandTag::Exec,
            CommandKind::ResolveProperty(_) => CommandTag::ResolveProperty,
        }
    }

    /// Borrow the command's payload.
    pub fn kind(&self) -> &CommandKind<D> {
        &self.kind
    }

    pub(crate) fn into_parts(self) -> (CommandKind<D>, Option<i32>) {
        (self.kind, self.priority)
    }

    fn validate(&self) -> std::result::Result<(), QueueError> {
        match &self.kind {
            CommandKind::WaitFrame(spec) => spec.validate(),
            _ => Ok(()),
        }
    }

    /// One-line description for queue dumps.
    pub fn describe(&self) -> String {
        match &self.kind {
            CommandKind::SendFrame(frame) => format!("{}: {}", self.tag().label(), frame),
            CommandKind::WaitFrame(spec) => format!("{} {:?}", self.tag().label(), spec),
            CommandKind::Exec(exec) => format!("{}: {}", self.tag().label(), exec.label),
            CommandKind::ResolveProperty(prop) => {
                format!("{}: {}", self.tag().label(), prop.borrow().name())
            }
        }
    }
}

impl<D> fmt::Debug for Command<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.priority {
            Some(p) => write!(f, "p:{} {}", p, self.describe()),
            None => write!(f, "p:- {}", self.describe()),
        }
    }
}

/// A send followed by a wait, sharing `priority`.
pub fn send_and_wait<D>(frame: Frame, spec: WaitSpec<D>, priority: Option<i32>) -> Vec<Command<D>> {
    vec![
        Command::new(CommandKind::SendFrame(frame), priority),
        Command::new(CommandKind::WaitFrame(spec), priority),
    ]
}

// ============================================================================
// Batches
// ============================================================================

/// A flattened group of commands submitted together.
pub struct Batch<D> {
    commands: Vec<Command<D>>,
}

impl<D> Batch<D> {
    /// Create an empty batch.
    pub fn new() -> Self {
        Batch {
            commands: Vec::new(),
        }
    }

    /// Append a command.
    pub fn push(&mut self, command: Command<D>) {
        self.commands.push(command);
    }

    /// Append every command of another batch.
    pub fn append(&mut self, other: impl Into<Batch<D>>) {
        self.commands.extend(other.into().commands);
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Validate the batch and force every command onto the first command's
    /// priority.
    pub(crate) fn into_uniform(
        self,
    ) -> std::result::Result<(Vec<Command<D>>, Option<i32>), QueueError> {
        let Some(first) = self.commands.first() else {
            return Err(QueueError::EmptyBatch);
        };
        let priority = first.priority;
        let mut commands = self.commands;
        for command in &mut commands {
            command.validate()?;
            command.set_priority(priority);
        }
        Ok((commands, priority))
    }
}

impl<D> Default for Batch<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> From<Command<D>> for Batch<D> {
    fn from(command: Command<D>) -> Self {
        Batch {
            commands: vec![command],
        }
    }
}

impl<D> From<Vec<Command<D>>> for Batch<D> {
    fn from(commands: Vec<Command<D>>) -> Self {
        Batch { commands }
    }
}

impl<D> From<Vec<Vec<Command<D>>>> for Batch<D> {
    fn from(nested: Vec<Vec<Command<D>>>) -> Self {
        Batch {
            commands: nested.into_iter().flatten().collect(),
        }
    }
}

impl<D> From<Vec<Batch<D>>> for Batch<D> {
    fn from(batches: Vec<Batch<D>>) -> Self {
        Batch {
            commands: batches.into_iter().flat_map(|b| b.commands).collect(),
        }
    }
}

impl<D> FromIterator<Command<D>> for Batch<D> {
    fn from_iter<I: IntoIterator<Item = Command<D>>>(iter: I) -> Self {
        Batch {
            commands: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_frame::FrameType;

    type Cmd = Command<()>;

    #[test]
    fn test_tag_codes() {
        for code in 0x01..=0x04u8 {
            assert_eq!(CommandTag::try_from(code).unwrap().code(), code);
        }
        assert_eq!(CommandTag::try_from(0x00), Err(QueueError::UnknownTag(0x00)));
        assert_eq!(CommandTag::try_from(0x05), Err(QueueError::UnknownTag(0x05)));
    }

    #[test]
    fn test_batch_forces_first_priority() {
        let batch: Batch<()> = vec![
            Cmd::send(Frame::new(FrameType::Version)).with_priority(2),
            Cmd::wait(WaitSpec::for_type(FrameType::Version)),
            Cmd::exec("noop", |_| Ok(())).with_priority(9),
        ]
        .into();

        let (commands, priority) = batch.into_uniform().unwrap();
        assert_eq!(priority, Some(2));
        assert!(commands.iter().all(|c| c.priority() == Some(2)));
    }

    #[test]
    fn test_batch_unprioritised_first_clears_rest() {
        let batch: Batch<()> = vec![
            Cmd::send(Frame::new(FrameType::Version)),
            Cmd::send(Frame::new(FrameType::DeviceState)).with_priority(1),
        ]
        .into();

        let (commands, priority) = batch.into_uniform().unwrap();
        assert_eq!(priority, None);
        assert!(commands.iter().all(|c| c.priority().is_none()));
    }

    #[test]
    fn test_nested_batches_flatten_in_order() {
        let batch: Batch<()> = vec![
            send_and_wait(
                Frame::new(FrameType::ReadParameter),
                WaitSpec::for_type(FrameType::ReadParameter),
                Some(1),
            ),
            vec![Cmd::exec("after", |_| Ok(()))],
        ]
        .into();

        let (commands, _) = batch.into_uniform().unwrap();
        let tags: Vec<CommandTag> = commands.iter().map(|c| c.tag()).collect();
        assert_eq!(
            tags,
            vec![CommandTag::SendFrame, CommandTag::WaitFrame, CommandTag::Exec]
        );
    }

    #[test]
    fn test_empty_batch_rejected() {
        let batch: Batch<()> = Batch::new();
        assert!(matches!(batch.into_uniform(), Err(QueueError::EmptyBatch)));
    }

    #[test]
    fn test_invalid_wait_rejected() {
        let batch: Batch<()> = Cmd::wait(WaitSpec::for_type(FrameType::Version).retry_max(0)).into();
        assert!(matches!(
            batch.into_uniform(),
            Err(QueueError::InvalidWaitSpec { .. })
        ));
    }

    #[test]
    fn test_describe() {
        let cmd = Cmd::send(Frame::new(FrameType::ReadParameter).with("param_id", 1u8)).with_priority(3);
        assert_eq!(format!("{:?}", cmd), "p:3 SEND: READ_PARAMETER {param_id=1}");
        let cmd = Cmd::exec("read_parameters", |_| Ok(()));
        assert_eq!(format!("{:?}", cmd), "p:- EXEC: read_parameters");
    }
}
