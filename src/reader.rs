//! Graph reader: bytes to list.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::codec::{records, Record};
use crate::executor::Executor;
use crate::materialize::{MaterializeError, PendingNodeTable};
use crate::serializer::SerializerError;
use crate::types::{chain, ListNode, NodeId, NodeRef};

/// Decode every record of `buf`, front to back.
///
/// All-or-nothing: the first malformed record fails the whole buffer.
pub fn decode_records(buf: &[u8]) -> Result<Vec<Record>, SerializerError> {
    if buf.is_empty() {
        return Err(SerializerError::EmptyInput);
    }

    let mut decoded = Vec::new();
    for item in records(buf) {
        match item {
            Ok((offset, record)) => {
                trace!(offset, id = %record.current, len = record.data.len(), "Decoded record");
                decoded.push(record);
            }
            Err(e) => {
                warn!(error = %e, bytes = buf.len(), "Rejected malformed buffer");
                return Err(e.into());
            }
        }
    }
    Ok(decoded)
}

/// Build a linked graph from records and return the node of the first one.
///
/// Shared by decoding and deep copy. Records are applied through a fresh
/// [`PendingNodeTable`], so they may arrive in any order and may reference
/// nodes whose own record comes later. The first record must still be the
/// head, and every record must be reachable from it through `next`.
pub(crate) fn materialize(
    records: Vec<Record>,
    executor: &Executor,
    verify_references: bool,
) -> Result<NodeRef, SerializerError> {
    let head_id = records
        .first()
        .map(|record| record.current)
        .ok_or(SerializerError::EmptyInput)?;

    let table = PendingNodeTable::new();
    let linked = link(&table, records, head_id, executor, verify_references);
    if linked.is_err() {
        table.sever();
    }
    linked
}

fn link(
    table: &PendingNodeTable,
    records: Vec<Record>,
    head_id: NodeId,
    executor: &Executor,
    verify_references: bool,
) -> Result<NodeRef, SerializerError> {
    let record_count = records.len();
    executor.run(records, |record| table.restore(record).map(drop))?;
    if verify_references {
        table.verify()?;
    }

    let head = table.get_or_create(head_id);
    let node_count = table.len();
    let walked: Vec<NodeRef> = chain(&head).take(node_count + 1).collect();
    // An acyclic walk visits each distinct node at most once.
    if walked.len() > node_count {
        return Err(SerializerError::CyclicChain);
    }
    if head.previous().is_some() {
        return Err(MaterializeError::HeadHasPredecessor(head_id).into());
    }
    // Nodes off the chain would be freed with the table, leaving random
    // links that silently resolve to nothing.
    let reachable: HashSet<*const ListNode> = walked.iter().map(Arc::as_ptr).collect();
    if let Some(id) = table.first_unreachable(&reachable) {
        return Err(MaterializeError::Unreachable(id).into());
    }

    debug!(records = record_count, nodes = node_count, "Materialized list");
    Ok(head)
}

/// Decode a buffer into a list and return its head.
pub fn decode_with(
    buf: &[u8],
    executor: &Executor,
    verify_references: bool,
) -> Result<NodeRef, SerializerError> {
    let records = decode_records(buf)?;
    materialize(records, executor, verify_references)
}

/// Decode with a default executor and reference verification.
pub fn decode_list(buf: &[u8]) -> Result<NodeRef, SerializerError> {
    decode_with(buf, &Executor::default(), true)
}
