//! Graph writer: list to bytes.

use tracing::debug;

use crate::codec::{CodecError, Record, HEADER_LEN};
use crate::executor::Executor;
use crate::identity::IdAssigner;
use crate::serializer::{ensure_head, SerializerError};
use crate::types::{collect_chain, NodeRef};

/// Walk the chain from `head`, rejecting loops in the successor links.
pub(crate) fn walk(head: &NodeRef) -> Result<Vec<NodeRef>, SerializerError> {
    ensure_head(head)?;
    collect_chain(head).map_err(|_| SerializerError::CyclicChain)
}

/// Encode the list starting at `head` into one contiguous buffer.
///
/// Each node is encoded independently against a shared, call-scoped
/// [`IdAssigner`]; records are concatenated in chain order.
pub fn encode_with(head: &NodeRef, executor: &Executor) -> Result<Vec<u8>, SerializerError> {
    let nodes = walk(head)?;
    let node_count = nodes.len();
    let ids = IdAssigner::new();

    let chunks = executor
        .run(nodes, |node| -> Result<Vec<u8>, CodecError> {
            Record::from_node(&node, &ids).encode()
        })
        .map_err(SerializerError::Encode)?;

    let total = chunks.iter().map(Vec::len).sum();
    let mut buffer = Vec::with_capacity(total);
    for chunk in &chunks {
        buffer.extend_from_slice(chunk);
    }

    debug!(
        nodes = node_count,
        ids = ids.issued(),
        bytes = buffer.len(),
        "Encoded list"
    );
    Ok(buffer)
}

/// Encode with a default executor.
pub fn encode_list(head: &NodeRef) -> Result<Vec<u8>, SerializerError> {
    encode_with(head, &Executor::default())
}

/// Encoded size of the list without allocating the buffer.
pub fn encoded_size(head: &NodeRef) -> Result<usize, SerializerError> {
    let nodes = walk(head)?;
    Ok(nodes
        .iter()
        .map(|node| HEADER_LEN + node.data().len())
        .sum())
}
