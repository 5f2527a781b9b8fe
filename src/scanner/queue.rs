//! Deduplicating bounded FIFO of repositories awaiting a scan.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::core::model::RepoId;

pub struct ScanQueue {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    items: VecDeque<RepoId>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
}

impl ScanQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// False when the queue is full or the pair is already queued or in
    /// flight. A full queue drops the candidate silently: backpressure
    /// against discovery bursts.
    pub fn try_enqueue(&self, id: RepoId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.items.len() >= self.capacity {
            return false;
        }
        let key = id.full_name();
        if inner.queued.contains(&key) || inner.in_flight.contains(&key) {
            return false;
        }
        inner.queued.insert(key);
        inner.items.push_back(id);
        true
    }

    /// Atomically dequeues the oldest pair and marks it in flight, so the
    /// pair is never absent from both sets while being processed.
    pub fn pop_in_flight(&self) -> Option<RepoId> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.items.pop_front()?;
        let key = id.full_name();
        inner.queued.remove(&key);
        inner.in_flight.insert(key);
        Some(id)
    }

    pub fn finish(&self, id: &RepoId) {
        self.inner.lock().unwrap().in_flight.remove(&id.full_name());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn in_flight(&self) -> Vec<String> {
        let mut repos: Vec<String> = self
            .inner
            .lock()
            .unwrap()
            .in_flight
            .iter()
            .cloned()
            .collect();
        repos.sort();
        repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> RepoId {
        RepoId::new("owner", name)
    }

    #[test]
    fn duplicate_enqueue_is_rejected() {
        let queue = ScanQueue::new(10);
        assert!(queue.try_enqueue(id("repo")));
        assert!(!queue.try_enqueue(id("repo")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn enqueue_beyond_capacity_is_dropped() {
        let queue = ScanQueue::new(2);
        assert!(queue.try_enqueue(id("a")));
        assert!(queue.try_enqueue(id("b")));
        assert!(!queue.try_enqueue(id("c")));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn pop_is_fifo_and_marks_in_flight() {
        let queue = ScanQueue::new(10);
        queue.try_enqueue(id("a"));
        queue.try_enqueue(id("b"));

        let first = queue.pop_in_flight().unwrap();
        assert_eq!(first.name, "a");
        assert_eq!(queue.in_flight(), vec!["owner/a".to_string()]);

        // Still in flight: re-enqueue must be refused
        assert!(!queue.try_enqueue(id("a")));

        queue.finish(&first);
        assert!(queue.in_flight().is_empty());
        assert!(queue.try_enqueue(id("a")));
    }

    #[test]
    fn pop_on_empty_queue_is_none() {
        let queue = ScanQueue::new(10);
        assert!(queue.pop_in_flight().is_none());
        assert!(queue.is_empty());
        assert!(!queue.is_full());
    }
}
