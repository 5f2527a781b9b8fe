//! In-process publish point for scanner state changes.
//!
//! The core emits typed events; an external push layer subscribes through
//! channels and handles its own transport. Subscribers that go away are
//! pruned on the next emit for their kind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::model::{ScanOutcome, StatusSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Full state snapshot.
    Status,
    /// Queue size change.
    Queue,
    /// A scan that produced at least one new finding.
    Finding,
}

#[derive(Debug, Clone)]
pub enum Event {
    Status(StatusSnapshot),
    Queue(usize),
    Finding(ScanOutcome),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Status(_) => EventKind::Status,
            Event::Queue(_) => EventKind::Queue,
            Event::Finding(_) => EventKind::Finding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscribers = HashMap<EventKind, Vec<(SubscriptionId, mpsc::UnboundedSender<Event>)>>;

#[derive(Default)]
pub struct StatusHub {
    next_id: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl StatusHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind.
    pub fn subscribe(&self, kind: EventKind) -> (SubscriptionId, mpsc::UnboundedReceiver<Event>) {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        if let Some(list) = self.subscribers.lock().unwrap().get_mut(&kind) {
            list.retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Delivers the event to every live subscriber of its kind.
    pub fn emit(&self, event: Event) {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(list) = subscribers.get_mut(&event.kind()) {
            list.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        }
    }
}
