//! Event Stream (§4.E): per-task monotonic sequencing, causal ordering,
//! and best-effort replay on reconnection. Grounded on the teacher's
//! `realtime_sync` event broadcast shape (`realtime_sync/types.rs`,
//! `realtime_sync/server.rs`), generalized from a global pub/sub bus to
//! one append-only buffer per task plus an id-keyed subscriber table.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::TaskId;

use super::event::{Event, EventKind};

const REPLAY_BUFFER_CAPACITY: usize = 256;
const BROADCAST_CAPACITY: usize = 256;

struct TaskStream {
    sequence: u64,
    /// Bounded ring of recently emitted events, used to serve replay
    /// requests for recently-disconnected clients (§4.E: "buffered events
    /// or reconstructs them from the snapshot + diff store").
    buffer: Vec<Event>,
    sender: broadcast::Sender<Event>,
}

impl TaskStream {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            sequence: 0,
            buffer: Vec::new(),
            sender,
        }
    }

    fn push(&mut self, kind: EventKind, task_id: TaskId) -> Event {
        self.sequence += 1;
        let event = Event::new(task_id, self.sequence, kind);
        self.buffer.push(event.clone());
        if self.buffer.len() > REPLAY_BUFFER_CAPACITY {
            self.buffer.remove(0);
        }
        // A broadcast send fails only when there are no receivers; that's
        // fine, events are still retained in `buffer` for later replay.
        let _ = self.sender.send(event.clone());
        event
    }
}

/// Central event stream keyed by task. One `TaskStream` per task that has
/// ever emitted an event in this process's lifetime.
pub struct EventStream {
    tasks: DashMap<TaskId, TaskStream>,
}

impl EventStream {
    pub fn new() -> Self {
        Self { tasks: DashMap::new() }
    }

    /// Emits `kind` for `task_id`, assigning the next sequence number.
    pub fn emit(&self, task_id: TaskId, kind: EventKind) -> Event {
        let mut entry = self.tasks.entry(task_id).or_insert_with(TaskStream::new);
        entry.push(kind, task_id)
    }

    /// Subscribes to live events for a task. `last_seen` optionally
    /// requests replay of buffered events strictly after that sequence.
    pub fn subscribe(&self, task_id: TaskId, last_seen: Option<u64>) -> (Vec<Event>, broadcast::Receiver<Event>) {
        let entry = self.tasks.entry(task_id).or_insert_with(TaskStream::new);
        let backlog = match last_seen {
            Some(seq) => entry.buffer.iter().filter(|e| e.sequence > seq).cloned().collect(),
            None => Vec::new(),
        };
        (backlog, entry.sender.subscribe())
    }

    pub fn current_sequence(&self, task_id: TaskId) -> u64 {
        self.tasks.get(&task_id).map(|t| t.sequence).unwrap_or(0)
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}
