//! Re-entrancy guard for destructive node operations
//!
//! A removal is a long-lived async operation from the UI's point of view. The
//! guard admits at most one in-flight operation per node; the slot is released
//! when the returned [`InFlightPermit`] drops, including on early return.

use crate::types::NodeId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Tracks nodes with an operation in flight
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<NodeId>>>,
}

/// Releases its node slot on drop
#[derive(Debug)]
pub struct InFlightPermit {
    node_id: NodeId,
    active: Arc<Mutex<HashSet<NodeId>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `node_id`; None if it is already taken
    pub fn try_acquire(&self, node_id: &str) -> Option<InFlightPermit> {
        let mut active = self.active.lock();
        if !active.insert(node_id.to_string()) {
            return None;
        }
        Some(InFlightPermit {
            node_id: node_id.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, node_id: &str) -> bool {
        self.active.lock().contains(node_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.active.lock().remove(&self.node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_second_acquire_is_rejected() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire("7");
        assert!(permit.is_some());
        assert!(guard.try_acquire("7").is_none());
        assert!(guard.is_active("7"));
    }

    #[test]
    fn test_slot_released_on_drop() {
        let guard = InFlightGuard::new();
        {
            let _permit = guard.try_acquire("7").unwrap();
            assert_eq!(guard.active_count(), 1);
        }
        assert_eq!(guard.active_count(), 0);
        assert!(guard.try_acquire("7").is_some());
    }

    #[test]
    fn test_different_nodes_dont_block() {
        let guard = InFlightGuard::new();
        let _a = guard.try_acquire("1").unwrap();
        let _b = guard.try_acquire("2").unwrap();
        assert_eq!(guard.active_count(), 2);
    }

    #[test]
    fn test_concurrent_acquire_admits_one() {
        let guard = InFlightGuard::new();
        let mut handles = vec![];
        for _ in 0..8 {
            let guard = guard.clone();
            handles.push(thread::spawn(move || guard.try_acquire("same").map(std::mem::forget).is_some()));
        }
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
