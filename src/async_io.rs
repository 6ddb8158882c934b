//! Tokio adapters for [`ListSerializer`].
//!
//! Encoding and decoding are CPU-bound and run on the blocking pool; only
//! the sink write and the source read are awaited on the caller's task.

use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::serializer::{ListSerializer, SerializerError};
use crate::types::NodeRef;

fn join_error(e: tokio::task::JoinError) -> SerializerError {
    SerializerError::Io(io::Error::new(io::ErrorKind::Other, e))
}

impl ListSerializer {
    /// Async counterpart of [`serialize`](Self::serialize).
    pub async fn serialize_async<W>(&self, head: &NodeRef, sink: &mut W) -> Result<(), SerializerError>
    where
        W: AsyncWrite + AsyncSeek + Unpin,
    {
        let worker = self.clone();
        let head = NodeRef::clone(head);
        let buffer = tokio::task::spawn_blocking(move || worker.encode(&head))
            .await
            .map_err(join_error)??;

        sink.write_all(&buffer).await?;
        sink.flush().await?;
        sink.seek(SeekFrom::Start(0)).await?;
        debug!(bytes = buffer.len(), "Serialized list");
        Ok(())
    }

    /// Async counterpart of [`deserialize`](Self::deserialize).
    pub async fn deserialize_async<R>(&self, source: &mut R) -> Result<NodeRef, SerializerError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = Vec::new();
        source.read_to_end(&mut buffer).await?;
        debug!(bytes = buffer.len(), "Deserializing list");

        let worker = self.clone();
        tokio::task::spawn_blocking(move || worker.decode(&buffer))
            .await
            .map_err(join_error)?
    }

    /// Async counterpart of [`deep_copy`](Self::deep_copy).
    pub async fn deep_copy_async(&self, head: &NodeRef) -> Result<NodeRef, SerializerError> {
        let worker = self.clone();
        let head = NodeRef::clone(head);
        tokio::task::spawn_blocking(move || worker.deep_copy(&head))
            .await
            .map_err(join_error)?
    }
}
