//! Cancellable delayed-task queue.
//!
//! DESIGN
//! ======
//! Tasks are plain values keyed by `(due, sequence)` in a `BTreeMap`, so
//! tasks due at the same instant fire in the order they were scheduled.
//! Nothing runs by itself: the owner pops due tasks with `pop_due(now)` and
//! dispatches them. Cancellation removes the entry outright, so a cancelled
//! task can never fire late.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

/// Handle for a scheduled task, valid until the task fires or is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// A task taken off the queue, with the instant it was due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TaskId,
    pub due: Instant,
    pub task: T,
}

#[derive(Debug)]
pub struct TaskQueue<T> {
    next_seq: u64,
    tasks: BTreeMap<(Instant, u64), T>,
    due_by_id: HashMap<u64, Instant>,
}

impl<T> TaskQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { next_seq: 0, tasks: BTreeMap::new(), due_by_id: HashMap::new() }
    }

    /// Schedule `task` to become due at `due`.
    pub fn schedule_at(&mut self, due: Instant, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert((due, seq), task);
        self.due_by_id.insert(seq, due);
        TaskId(seq)
    }

    /// Schedule `task` to become due `delay` after `now`.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, task: T) -> TaskId {
        self.schedule_at(now + delay, task)
    }

    /// Cancel a pending task. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let due = self.due_by_id.remove(&id.0)?;
        self.tasks.remove(&(due, id.0))
    }

    /// Cancel every pending task, returning how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        self.due_by_id.clear();
        dropped
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Fired<T>> {
        let (&(due, seq), _) = self.tasks.first_key_value()?;
        if due > now {
            return None;
        }
        self.due_by_id.remove(&seq);
        self.tasks.remove(&(due, seq)).map(|task| Fired { id: TaskId(seq), due, task })
    }

    /// Instant of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.first_key_value().map(|(&(due, _), _)| due)
    }

    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tasks.values()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
