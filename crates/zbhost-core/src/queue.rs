//! Priority-ordered command queue.
//!
//! Two insertion policies exist:
//!
//! - [`CommandQueue::enqueue`]: a prioritised batch goes before the first
//!   command that is unprioritised or has a strictly greater priority, so
//!   equal priorities keep submission order. An unprioritised batch goes to
//!   the back.
//! - [`CommandQueue::enqueue_front`]: an unprioritised batch goes before the
//!   first unprioritised command. A prioritised batch goes before the first
//!   command that is unprioritised or has a greater-or-equal priority, so the
//!   newest batch of a given priority runs first.
//!
//! Batches are never interleaved: commands of one batch stay contiguous and
//! in their original order.

use std::collections::VecDeque;

use crate::{Batch, Command, QueueError};

/// The scheduler's pending commands.
pub struct CommandQueue<D> {
    items: VecDeque<Command<D>>,
}

impl<D> CommandQueue<D> {
    /// Create an empty queue.
    pub fn new() -> Self {
        CommandQueue {
            items: VecDeque::new(),
        }
    }

    /// Insert a batch with normal-priority semantics.
    ///
    /// Returns the index the batch was inserted at.
    pub fn enqueue(&mut self, batch: impl Into<Batch<D>>) -> Result<usize, QueueError> {
        let (commands, priority) = batch.into().into_uniform()?;
        let index = match priority {
            Some(p) => self
                .position(|q| q.map_or(true, |q| q > p))
                .unwrap_or(self.items.len()),
            None => self.items.len(),
        };
        self.insert_at(index, commands);
        Ok(index)
    }

    /// Insert a batch with jump-the-queue semantics.
    ///
    /// Returns the index the batch was inserted at.
    pub fn enqueue_front(&mut self, batch: impl Into<Batch<D>>) -> Result<usize, QueueError> {
        let (commands, priority) = batch.into().into_uniform()?;
        let index = match priority {
            Some(p) => self.position(|q| q.map_or(true, |q| q >= p)),
            None => self.position(|q| q.is_none()),
        }
        .unwrap_or(self.items.len());
        self.insert_at(index, commands);
        Ok(index)
    }

    fn position(&self, pred: impl Fn(Option<i32>) -> bool) -> Option<usize> {
        self.items.iter().position(|c| pred(c.priority()))
    }

    fn insert_at(&mut self, index: usize, commands: Vec<Command<D>>) {
        for (offset, command) in commands.into_iter().enumerate() {
            self.items.insert(index + offset, command);
        }
    }

    /// Remove the head command.
    pub fn pop_front(&mut self) -> Option<Command<D>> {
        self.items.pop_front()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Command<D>> {
        self.items.iter()
    }

    /// Priorities from head to tail.
    pub fn priorities(&self) -> Vec<Option<i32>> {
        self.items.iter().map(|c| c.priority()).collect()
    }

    /// One line per queued command, head first.
    pub fn dump(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:3}: {:?}", i, c))
            .collect()
    }
}

impl<D> Default for CommandQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_frame::{Frame, FrameType};

    type Queue = CommandQueue<()>;

    fn cmd(label: &str, priority: Option<i32>) -> Command<()> {
        let c = Command::exec(label.to_string(), |_| Ok(()));
        match priority {
            Some(p) => c.with_priority(p),
            None => c,
        }
    }

    fn labels(queue: &Queue) -> Vec<String> {
        queue
            .iter()
            .map(|c| match c.kind() {
                crate::CommandKind::Exec(e) => e.label.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn test_enqueue_orders_by_priority() {
        let mut q = Queue::new();
        q.enqueue(cmd("a", Some(5))).unwrap();
        q.enqueue(cmd("b", Some(1))).unwrap();
        q.enqueue(cmd("c", Some(3))).unwrap();
        q.enqueue(cmd("d", None)).unwrap();

        assert_eq!(labels(&q), vec!["b", "c", "a", "d"]);
        assert_eq!(q.priorities(), vec![Some(1), Some(3), Some(5), None]);
    }

    #[test]
    fn test_enqueue_equal_priority_is_fifo() {
        let mut q = Queue::new();
        q.enqueue(cmd("first", Some(2))).unwrap();
        q.enqueue(cmd("second", Some(2))).unwrap();
        assert_eq!(labels(&q), vec!["first", "second"]);
    }

    #[test]
    fn test_enqueue_prioritised_goes_before_unprioritised() {
        let mut q = Queue::new();
        q.enqueue(cmd("x", None)).unwrap();
        let index = q.enqueue(cmd("y", Some(9))).unwrap();
        assert_eq!(index, 0);
        assert_eq!(labels(&q), vec!["y", "x"]);
    }

    #[test]
    fn test_enqueue_front_equal_priority_is_lifo() {
        let mut q = Queue::new();
        q.enqueue(cmd("old", Some(2))).unwrap();
        q.enqueue_front(cmd("new", Some(2))).unwrap();
        assert_eq!(labels(&q), vec!["new", "old"]);
    }

    #[test]
    fn test_enqueue_front_unprioritised_after_prioritised() {
        let mut q = Queue::new();
        q.enqueue(cmd("p", Some(1))).unwrap();
        q.enqueue(cmd("u1", None)).unwrap();
        q.enqueue(cmd("u2", None)).unwrap();
        let index = q.enqueue_front(cmd("front", None)).unwrap();

        assert_eq!(index, 1);
        assert_eq!(labels(&q), vec!["p", "front", "u1", "u2"]);
    }

    #[test]
    fn test_enqueue_front_on_empty() {
        let mut q = Queue::new();
        assert_eq!(q.enqueue_front(cmd("only", Some(4))).unwrap(), 0);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_batch_stays_contiguous() {
        let mut q = Queue::new();
        q.enqueue(cmd("a", Some(1))).unwrap();
        q.enqueue(cmd("z", Some(3))).unwrap();
        q.enqueue(vec![cmd("b1", Some(2)), cmd("b2", Some(0)), cmd("b3", None)])
            .unwrap();

        assert_eq!(labels(&q), vec!["a", "b1", "b2", "b3", "z"]);
        assert_eq!(
            q.priorities(),
            vec![Some(1), Some(2), Some(2), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_unprioritised_batch_order_preserved() {
        let mut q = Queue::new();
        q.enqueue(vec![cmd("1", None), cmd("2", None)]).unwrap();
        q.enqueue(vec![cmd("3", None), cmd("4", None)]).unwrap();
        assert_eq!(labels(&q), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_rejected_batch_leaves_queue_untouched() {
        let mut q = Queue::new();
        q.enqueue(cmd("a", None)).unwrap();
        assert_eq!(q.enqueue(Batch::new()), Err(QueueError::EmptyBatch));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_dump() {
        let mut q = Queue::new();
        q.enqueue(Command::send(Frame::new(FrameType::Version)).with_priority(1))
            .unwrap();
        assert_eq!(q.dump(), vec!["  0: p:1 SEND: VERSION".to_string()]);
    }
}
