//! Call-scoped node identity.
//!
//! Nodes carry no identifier of their own. An [`IdAssigner`] hands out one
//! stable [`NodeId`] per node the first time it sees it and returns the same
//! value afterwards, without touching the node's fields.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::types::{ListNode, NodeId, NodeRef};

/// Assigns monotonic identifiers to nodes for the lifetime of the assigner.
///
/// The table is keyed by allocation address and only holds `Weak` handles,
/// so it never keeps a node alive. Safe to share between worker threads:
/// lookup and insertion happen under one lock, so a node can never receive
/// two identifiers.
#[derive(Debug, Default)]
pub struct IdAssigner {
    counter: AtomicU64,
    // The Weak pins the allocation, so an address cannot be recycled for a
    // different node while this assigner lives.
    table: Mutex<HashMap<usize, (Weak<ListNode>, NodeId)>>,
}

impl IdAssigner {
    /// Create an assigner with an empty table. The first identifier is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for an optional node; `None` stays `None` (wire value 0).
    pub fn id_of(&self, node: Option<&NodeRef>) -> Option<NodeId> {
        node.map(|node| self.assign(node))
    }

    /// Identifier for `node`, assigning the next counter value if unseen.
    pub fn assign(&self, node: &NodeRef) -> NodeId {
        let key = Arc::as_ptr(node) as usize;
        let mut table = self.table.lock();
        if let Some((_, id)) = table.get(&key) {
            return *id;
        }
        let id = self.next_id();
        table.insert(key, (Arc::downgrade(node), id));
        id
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    fn next_id(&self) -> NodeId {
        let previous = self.counter.fetch_add(1, Ordering::AcqRel);
        NodeId::from(NonZeroU64::MIN.saturating_add(previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::build_chain;

    #[test]
    fn test_null_maps_to_none() {
        let ids = IdAssigner::new();
        assert_eq!(ids.id_of(None), None);
        assert_eq!(ids.issued(), 0);
    }

    #[test]
    fn test_ids_start_at_one_and_are_stable() {
        let nodes = build_chain(["a", "b"]);
        let ids = IdAssigner::new();

        let a = ids.assign(&nodes[0]);
        let b = ids.assign(&nodes[1]);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(ids.assign(&nodes[0]), a);
        assert_eq!(ids.id_of(Some(&nodes[1])), Some(b));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_assigners_are_independent() {
        let nodes = build_chain(["a", "b"]);
        let first = IdAssigner::new();
        let second = IdAssigner::new();

        first.assign(&nodes[0]);
        assert_eq!(second.assign(&nodes[1]).get(), 1);
    }

    #[test]
    fn test_does_not_keep_nodes_alive() {
        let ids = IdAssigner::new();
        let node = ListNode::new("short-lived");
        ids.assign(&node);

        let weak = Arc::downgrade(&node);
        drop(node);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_concurrent_assignment_is_consistent() {
        let nodes = build_chain((0..64).map(|i| i.to_string()));
        let ids = IdAssigner::new();

        let results: Vec<Vec<NodeId>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| nodes.iter().map(|n| ids.assign(n)).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for other in &results[1..] {
            assert_eq!(other, &results[0]);
        }
        assert_eq!(ids.issued(), 64);
    }
}
