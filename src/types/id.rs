//! Node identifiers used on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Call-scoped identifier of a list node.
///
/// Wraps a `NonZeroU64` so that the wire value `0` can only ever mean
/// "no node". Identifiers are handed out by an [`IdAssigner`](crate::identity::IdAssigner)
/// and carry no meaning outside the call that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Create a NodeId from a raw wire value. Returns `None` for `0`.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Get the raw wire value.
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    /// Wire value for an optional identifier (`0` when absent).
    pub fn to_wire(id: Option<NodeId>) -> u64 {
        id.map_or(0, |id| id.get())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<NonZeroU64> for NodeId {
    fn from(raw: NonZeroU64) -> Self {
        Self(raw)
    }
}
