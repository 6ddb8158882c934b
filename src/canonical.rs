//! Canonical topology snapshots for comparing lists.
//!
//! Identifiers are call-scoped, so two encodings of the same list need not be
//! byte-identical. A [`ListSnapshot`] describes a list by what survives a
//! round-trip: payloads in chain order and each random target as a chain
//! position.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Positions, never addresses or identifiers, describe edges

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use xxhash_rust::xxh64::xxh64;

use crate::types::{chain, ListNode, NodeRef};

/// Where a random pointer leads, relative to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RandomTarget {
    /// No random pointer.
    None,
    /// The node at this chain position.
    Position(usize),
    /// A live node that is not part of the chain.
    Outside,
}

/// Order-stable description of a list's topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
    /// Payloads in chain order.
    pub values: Vec<String>,
    /// Random target of each node, by position.
    pub random: Vec<RandomTarget>,
    /// Whether every back link points at the chain predecessor.
    pub back_links_consistent: bool,
}

impl ListSnapshot {
    /// Describe the chain starting at `head`. Stops early if successor links loop.
    pub fn capture(head: &NodeRef) -> Self {
        let mut nodes: Vec<NodeRef> = Vec::new();
        let mut positions: HashMap<*const ListNode, usize> = HashMap::new();
        for node in chain(head) {
            if positions.insert(Arc::as_ptr(&node), nodes.len()).is_some() {
                break;
            }
            nodes.push(node);
        }

        let random = nodes
            .iter()
            .map(|node| match node.random() {
                None => RandomTarget::None,
                Some(target) => positions
                    .get(&Arc::as_ptr(&target))
                    .map_or(RandomTarget::Outside, |p| RandomTarget::Position(*p)),
            })
            .collect();

        let back_links_consistent = nodes.iter().enumerate().all(|(i, node)| {
            match (i.checked_sub(1).map(|p| &nodes[p]), node.previous()) {
                (None, None) => true,
                (Some(expected), Some(actual)) => Arc::ptr_eq(expected, &actual),
                _ => false,
            }
        });

        Self {
            values: nodes.iter().map(|node| node.data()).collect(),
            random,
            back_links_consistent,
        }
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for an empty snapshot.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// xxh64 fingerprint of the canonical bytes.
    pub fn fingerprint(&self) -> Result<u64, serde_json::Error> {
        canonical_hash(self)
    }
}

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, serde_json::Error> {
    Ok(xxh64(&to_canonical_bytes(value)?, 0))
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::build_chain;

    #[test]
    fn test_capture_positions() {
        let nodes = build_chain(["a", "b", "c"]);
        nodes[0].set_random(Some(&nodes[2]));
        nodes[2].set_random(Some(&nodes[2]));

        let snapshot = ListSnapshot::capture(&nodes[0]);
        assert_eq!(snapshot.values, vec!["a", "b", "c"]);
        assert_eq!(
            snapshot.random,
            vec![
                RandomTarget::Position(2),
                RandomTarget::None,
                RandomTarget::Position(2)
            ]
        );
        assert!(snapshot.back_links_consistent);
    }

    #[test]
    fn test_outside_target_and_broken_back_link() {
        let nodes = build_chain(["a", "b"]);
        let stranger = ListNode::new("stranger");
        nodes[1].set_random(Some(&stranger));
        nodes[1].set_previous(Some(&stranger));

        let snapshot = ListSnapshot::capture(&nodes[0]);
        assert_eq!(snapshot.random[1], RandomTarget::Outside);
        assert!(!snapshot.back_links_consistent);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let first = build_chain(["a", "b"]);
        let second = build_chain(["a", "b"]);
        let a = ListSnapshot::capture(&first[0]).fingerprint().unwrap();
        let b = ListSnapshot::capture(&second[0]).fingerprint().unwrap();
        assert_eq!(a, b);

        let third = build_chain(["a", "c"]);
        assert_ne!(a, ListSnapshot::capture(&third[0]).fingerprint().unwrap());
    }
}
