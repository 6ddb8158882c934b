//! List node types.
//!
//! A list is a chain of [`ListNode`]s shared behind [`NodeRef`] handles. The
//! chain owns its nodes through `next`; `previous` and `random` are weak
//! references, so a random pointer to itself or to an earlier node never
//! forms a reference cycle.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Shared handle to a list node.
pub type NodeRef = Arc<ListNode>;

/// A node of a doubly-linked list with a random side pointer.
///
/// Every field sits behind its own lock so that nodes can be linked from
/// several worker threads at once while a graph is being materialized.
#[derive(Default)]
pub struct ListNode {
    data: RwLock<String>,
    next: RwLock<Option<NodeRef>>,
    previous: RwLock<Weak<ListNode>>,
    random: RwLock<Weak<ListNode>>,
}

impl ListNode {
    /// Create a detached node carrying `data`.
    pub fn new(data: impl Into<String>) -> NodeRef {
        let node = Self::default();
        *node.data.write() = data.into();
        Arc::new(node)
    }

    /// Create an empty node whose payload is filled in later.
    pub fn placeholder() -> NodeRef {
        Arc::new(Self::default())
    }

    /// Get a copy of the payload.
    pub fn data(&self) -> String {
        self.data.read().clone()
    }

    /// Replace the payload.
    pub fn set_data(&self, data: impl Into<String>) {
        *self.data.write() = data.into();
    }

    /// Successor in the chain.
    pub fn next(&self) -> Option<NodeRef> {
        self.next.read().clone()
    }

    /// Replace the successor. Does not touch the successor's back link.
    pub fn set_next(&self, next: Option<NodeRef>) {
        *self.next.write() = next;
    }

    /// Predecessor in the chain, if it is still alive.
    pub fn previous(&self) -> Option<NodeRef> {
        self.previous.read().upgrade()
    }

    /// Replace the back link.
    pub fn set_previous(&self, previous: Option<&NodeRef>) {
        *self.previous.write() = previous.map(Arc::downgrade).unwrap_or_default();
    }

    /// Set the back link only if none is set yet. Returns whether it was set.
    pub fn set_previous_if_unset(&self, previous: &NodeRef) -> bool {
        let mut slot = self.previous.write();
        if slot.strong_count() > 0 {
            return false;
        }
        *slot = Arc::downgrade(previous);
        true
    }

    /// Random target, if any and still alive.
    pub fn random(&self) -> Option<NodeRef> {
        self.random.read().upgrade()
    }

    /// Replace the random target.
    pub fn set_random(&self, random: Option<&NodeRef>) {
        *self.random.write() = random.map(Arc::downgrade).unwrap_or_default();
    }

    /// True when the node has no predecessor.
    pub fn is_head(&self) -> bool {
        self.previous().is_none()
    }

    /// Link `next` after `node`, setting both directions.
    pub fn link(node: &NodeRef, next: &NodeRef) {
        node.set_next(Some(Arc::clone(next)));
        next.set_previous(Some(node));
    }
}

impl fmt::Debug for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNode")
            .field("data", &*self.data.read())
            .field("has_next", &self.next.read().is_some())
            .field("has_previous", &(self.previous.read().strong_count() > 0))
            .field("has_random", &(self.random.read().strong_count() > 0))
            .finish()
    }
}

// Unlink the owned chain iteratively so long lists do not overflow the stack.
impl Drop for ListNode {
    fn drop(&mut self) {
        let mut next = self.next.get_mut().take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => next = inner.next.get_mut().take(),
                Err(_) => break,
            }
        }
    }
}

/// Forward iterator over a chain, following `next` links.
///
/// Random links never extend the walk.
#[derive(Debug, Clone)]
pub struct Chain {
    current: Option<NodeRef>,
}

impl Iterator for Chain {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let node = self.current.take()?;
        self.current = node.next();
        Some(node)
    }
}

/// Walk the chain starting at `head`.
pub fn chain(head: &NodeRef) -> Chain {
    Chain {
        current: Some(Arc::clone(head)),
    }
}

/// Collect the chain starting at `head`, failing if a node is visited twice.
///
/// Returns the node that closes the loop on failure.
pub fn collect_chain(head: &NodeRef) -> Result<Vec<NodeRef>, NodeRef> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for node in chain(head) {
        if !seen.insert(Arc::as_ptr(&node)) {
            return Err(node);
        }
        nodes.push(node);
    }
    Ok(nodes)
}

/// Build a linked chain from payloads.
///
/// Returns every node in order so callers can wire random pointers; the
/// first element is the head. An empty input yields an empty vector.
pub fn build_chain<I, S>(values: I) -> Vec<NodeRef>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let nodes: Vec<NodeRef> = values.into_iter().map(ListNode::new).collect();
    for pair in nodes.windows(2) {
        ListNode::link(&pair[0], &pair[1]);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chain_links_both_directions() {
        let nodes = build_chain(["a", "b", "c"]);
        assert!(nodes[0].is_head());
        assert!(Arc::ptr_eq(&nodes[0].next().unwrap(), &nodes[1]));
        assert!(Arc::ptr_eq(&nodes[2].previous().unwrap(), &nodes[1]));
        assert!(nodes[2].next().is_none());

        let walked: Vec<String> = chain(&nodes[0]).map(|n| n.data()).collect();
        assert_eq!(walked, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_random_self_reference_does_not_leak() {
        let node = ListNode::new("solo");
        node.set_random(Some(&node));
        assert!(Arc::ptr_eq(&node.random().unwrap(), &node));

        let weak = Arc::downgrade(&node);
        drop(node);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_previous_first_writer_wins() {
        let a = ListNode::new("a");
        let b = ListNode::new("b");
        let c = ListNode::new("c");

        assert!(c.set_previous_if_unset(&a));
        assert!(!c.set_previous_if_unset(&b));
        assert!(Arc::ptr_eq(&c.previous().unwrap(), &a));
    }

    #[test]
    fn test_collect_chain_detects_loop() {
        let nodes = build_chain(["a", "b", "c"]);
        nodes[2].set_next(Some(Arc::clone(&nodes[1])));

        let looped = collect_chain(&nodes[0]).unwrap_err();
        assert!(Arc::ptr_eq(&looped, &nodes[1]));

        // Break the strong cycle so the test does not leak.
        nodes[2].set_next(None);
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let nodes = build_chain((0..200_000).map(|i| i.to_string()));
        let head = Arc::clone(&nodes[0]);
        drop(nodes);
        drop(head);
    }
}
