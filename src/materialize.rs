//! Reserve-then-populate graph materialization.
//!
//! A [`PendingNodeTable`] maps identifiers to nodes while a graph is being
//! rebuilt. The first mention of an identifier (as a record's own node, its
//! successor, or its random target) reserves a placeholder; the record that
//! owns the identifier later populates it. This is what lets a record refer
//! to a node whose own record has not been processed yet.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::codec::Record;
use crate::types::{ListNode, NodeId, NodeRef};

/// Inconsistent set of records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    /// Two records define the same node.
    #[error("Node {0} is defined by more than one record")]
    DuplicateRecord(NodeId),
    /// A record references a node that no record defines.
    #[error("Node {0} is referenced but never defined")]
    DanglingReference(NodeId),
    /// The first record's node is the successor of another record.
    #[error("First node {0} has a predecessor")]
    HeadHasPredecessor(NodeId),
    /// A defined node cannot be reached from the head through `next`.
    #[error("Node {0} is not reachable from the head")]
    Unreachable(NodeId),
}

#[derive(Debug)]
struct Slot {
    node: NodeRef,
    populated: bool,
}

/// Identifier to node table scoped to a single decode or copy.
#[derive(Debug, Default)]
pub struct PendingNodeTable {
    slots: Mutex<HashMap<NodeId, Slot>>,
}

impl PendingNodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `id`, reserving a placeholder if the id is new.
    pub fn get_or_create(&self, id: NodeId) -> NodeRef {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_insert_with(|| Slot {
            node: ListNode::placeholder(),
            populated: false,
        });
        Arc::clone(&slot.node)
    }

    /// Reserve `id` if needed and mark it populated. Fails if already populated.
    fn claim(&self, id: NodeId) -> Result<NodeRef, MaterializeError> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_insert_with(|| Slot {
            node: ListNode::placeholder(),
            populated: false,
        });
        if slot.populated {
            return Err(MaterializeError::DuplicateRecord(id));
        }
        slot.populated = true;
        Ok(Arc::clone(&slot.node))
    }

    /// Apply one record: populate its node and wire its links.
    ///
    /// The back link of the successor is only set if it has none yet.
    pub fn restore(&self, record: Record) -> Result<NodeRef, MaterializeError> {
        let current = self.claim(record.current)?;
        current.set_data(record.data);

        if let Some(next_id) = record.next {
            let next = self.get_or_create(next_id);
            next.set_previous_if_unset(&current);
            current.set_next(Some(next));
        }

        if let Some(random_id) = record.random {
            let random = self.get_or_create(random_id);
            current.set_random(Some(&random));
        }

        Ok(current)
    }

    /// Identifiers that were referenced but never populated, in ascending order.
    pub fn unresolved(&self) -> Vec<NodeId> {
        let slots = self.slots.lock();
        let mut ids: Vec<NodeId> = slots
            .iter()
            .filter(|(_, slot)| !slot.populated)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Fail on the smallest unresolved identifier, if any.
    pub fn verify(&self) -> Result<(), MaterializeError> {
        match self.unresolved().first() {
            Some(id) => Err(MaterializeError::DanglingReference(*id)),
            None => Ok(()),
        }
    }

    /// Smallest populated identifier whose node is not in `reachable`.
    pub fn first_unreachable(&self, reachable: &HashSet<*const ListNode>) -> Option<NodeId> {
        let slots = self.slots.lock();
        slots
            .iter()
            .filter(|(_, slot)| slot.populated && !reachable.contains(&Arc::as_ptr(&slot.node)))
            .map(|(id, _)| *id)
            .min()
    }

    /// Drop every successor link held by the table's nodes.
    ///
    /// Used when a graph is abandoned half-built, so looping successor
    /// links cannot keep it alive.
    pub fn sever(&self) {
        let slots = self.slots.lock();
        for slot in slots.values() {
            slot.node.set_next(None);
        }
    }

    /// Number of identifiers known to the table.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True if nothing has been reserved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn record(current: u64, next: u64, random: u64, data: &str) -> Record {
        Record {
            current: id(current),
            next: NodeId::new(next),
            random: NodeId::new(random),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let table = PendingNodeTable::new();
        let a = table.get_or_create(id(5));
        let b = table.get_or_create(id(5));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_forward_reference_is_populated_later() {
        let table = PendingNodeTable::new();
        let head = table.restore(record(1, 2, 3, "a")).unwrap();
        assert_eq!(table.unresolved(), vec![id(2), id(3)]);

        let placeholder = head.random().unwrap();
        assert_eq!(placeholder.data(), "");

        table.restore(record(2, 3, 1, "b")).unwrap();
        table.restore(record(3, 0, 0, "c")).unwrap();
        table.verify().unwrap();

        assert_eq!(head.random().unwrap().data(), "c");
        assert!(Arc::ptr_eq(&placeholder, &head.random().unwrap()));
        let second = head.next().unwrap();
        assert!(Arc::ptr_eq(&second.previous().unwrap(), &head));
        assert!(Arc::ptr_eq(&second.random().unwrap(), &head));
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let table = PendingNodeTable::new();
        table.restore(record(1, 0, 0, "a")).unwrap();
        assert_eq!(
            table.restore(record(1, 0, 0, "again")).unwrap_err(),
            MaterializeError::DuplicateRecord(id(1))
        );
    }

    #[test]
    fn test_dangling_reference_reported() {
        let table = PendingNodeTable::new();
        table.restore(record(1, 0, 9, "a")).unwrap();
        assert_eq!(
            table.verify().unwrap_err(),
            MaterializeError::DanglingReference(id(9))
        );
    }

    #[test]
    fn test_first_unreachable_ignores_placeholders() {
        let table = PendingNodeTable::new();
        let head = table.restore(record(1, 0, 7, "a")).unwrap();
        table.restore(record(4, 0, 0, "island")).unwrap();
        table.restore(record(3, 0, 0, "island")).unwrap();

        let reachable: HashSet<*const ListNode> = [Arc::as_ptr(&head)].into_iter().collect();
        assert_eq!(table.first_unreachable(&reachable), Some(id(3)));
    }

    #[test]
    fn test_previous_not_overwritten() {
        let table = PendingNodeTable::new();
        let first = table.restore(record(1, 3, 0, "first")).unwrap();
        table.restore(record(2, 3, 0, "second")).unwrap();
        let shared = table.get_or_create(id(3));
        assert!(Arc::ptr_eq(&shared.previous().unwrap(), &first));
    }
}
