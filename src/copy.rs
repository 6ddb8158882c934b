//! Deep copy without a byte round-trip.

use std::convert::Infallible;
use tracing::debug;

use crate::codec::Record;
use crate::executor::Executor;
use crate::identity::IdAssigner;
use crate::reader::materialize;
use crate::serializer::SerializerError;
use crate::types::NodeRef;
use crate::writer::walk;

/// Clone the list starting at `head` into freshly allocated nodes.
///
/// Uses its own [`IdAssigner`] and pending table, so identifiers never
/// leak between calls.
pub fn deep_copy_with(
    head: &NodeRef,
    executor: &Executor,
    verify_references: bool,
) -> Result<NodeRef, SerializerError> {
    let nodes = walk(head)?;
    let ids = IdAssigner::new();

    let records = executor
        .run(nodes, |node| Ok::<_, Infallible>(Record::from_node(&node, &ids)))
        .unwrap_or_else(|never| match never {});

    let copy = materialize(records, executor, verify_references)?;
    debug!(ids = ids.issued(), "Deep-copied list");
    Ok(copy)
}

/// Deep copy with a default executor.
pub fn deep_copy(head: &NodeRef) -> Result<NodeRef, SerializerError> {
    deep_copy_with(head, &Executor::default(), true)
}
