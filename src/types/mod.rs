//! Core types for the list codec.

pub mod id;
pub mod node;

pub use id::NodeId;
pub use node::{build_chain, chain, collect_chain, Chain, ListNode, NodeRef};
