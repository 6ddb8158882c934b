//! # linked-graph-codec
//!
//! Binary serialization and deep copy for doubly-linked lists whose nodes
//! carry a "random" side pointer to any node of the same list.
//!
//! ## Core Contract
//!
//! 1. Serialize a list, given its head, into one flat buffer of records
//! 2. Deserialize a buffer back into a graph with the same forward, backward
//!    and random links, including random cycles and forward references
//! 3. Deep-copy a live list into new nodes through the same machinery
//!
//! ## Architecture
//!
//! ```text
//! head → chain walk → IdAssigner → Record::encode (per node, parallel) → buffer
//! buffer → RecordIter → PendingNodeTable::restore (per record, parallel) → head
//! head → chain walk → IdAssigner → Record (in memory) → PendingNodeTable → copy
//! ```
//!
//! ## Wire Format
//!
//! ```text
//! record := u64 current | u64 next | u64 random | u32 payload_len | payload
//! buffer := record*
//! ```
//!
//! Little-endian, no header, no padding. Identifiers are call-scoped; `0`
//! means "no node".
//!
//! ## Determinism Guarantees
//!
//! - Records are written in chain order regardless of which encode finishes first
//! - The decoded head is always the node of the first record
//! - Decoding the same buffer twice yields the same topology

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod identity;
pub mod codec;
pub mod materialize;
pub mod executor;
pub mod config;
pub mod writer;
pub mod reader;
pub mod copy;
pub mod serializer;
pub mod canonical;

#[cfg(feature = "async")]
pub mod async_io;

// Re-exports
pub use types::{build_chain, chain, Chain, ListNode, NodeId, NodeRef};
pub use identity::IdAssigner;
pub use codec::{records, CodecError, Record, RecordIter, HEADER_LEN};
pub use materialize::{MaterializeError, PendingNodeTable};
pub use executor::Executor;
pub use config::SerializerConfig;
pub use writer::{encode_list, encoded_size};
pub use reader::{decode_list, decode_records};
pub use copy::deep_copy;
pub use serializer::{ListSerializer, SerializerError};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes, ListSnapshot, RandomTarget};
