//! Stream-facing serializer.
//!
//! [`ListSerializer`] adapts the byte-level writer, reader and deep copy to
//! `std::io` sinks and sources and carries the configured [`Executor`].

use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

use crate::codec::CodecError;
use crate::config::SerializerConfig;
use crate::copy::deep_copy_with;
use crate::executor::Executor;
use crate::materialize::MaterializeError;
use crate::reader::decode_with;
use crate::types::NodeRef;
use crate::writer::encode_with;

/// Error type for serializer operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// The node passed as head has a predecessor.
    #[error("Expected a head node, but the node has a predecessor")]
    NotHead,
    /// Nothing to decode.
    #[error("Input is empty")]
    EmptyInput,
    /// A record could not be decoded.
    #[error("Malformed input: {0}")]
    Malformed(#[from] CodecError),
    /// A node could not be encoded.
    #[error("Cannot encode node: {0}")]
    Encode(#[source] CodecError),
    /// The records do not describe a consistent graph.
    #[error("Inconsistent records: {0}")]
    Inconsistent(#[from] MaterializeError),
    /// Successor links loop instead of ending.
    #[error("Successor links loop back into the list")]
    CyclicChain,
    /// The dedicated worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Reading the source or writing the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reject a node that is not the head of its list.
pub(crate) fn ensure_head(head: &NodeRef) -> Result<(), SerializerError> {
    if head.is_head() {
        Ok(())
    } else {
        Err(SerializerError::NotHead)
    }
}

/// Serializes, deserializes and deep-copies lists.
#[derive(Debug, Clone)]
pub struct ListSerializer {
    config: SerializerConfig,
    executor: Executor,
}

impl ListSerializer {
    /// Serializer with default configuration on rayon's global pool.
    pub fn new() -> Self {
        let config = SerializerConfig::default();
        let executor = Executor::global(config.parallel_threshold);
        Self { config, executor }
    }

    /// Serializer for `config`, starting a dedicated pool if requested.
    pub fn with_config(config: SerializerConfig) -> Result<Self, SerializerError> {
        let executor = Executor::from_config(&config)?;
        Ok(Self { config, executor })
    }

    /// Serializer configured from `LIST_CODEC_*` environment variables.
    pub fn from_env() -> Result<Self, SerializerError> {
        Self::with_config(SerializerConfig::from_env())
    }

    /// Active configuration.
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Encode the list starting at `head` into a buffer.
    pub fn encode(&self, head: &NodeRef) -> Result<Vec<u8>, SerializerError> {
        encode_with(head, &self.executor)
    }

    /// Decode a buffer and return the head of the rebuilt list.
    pub fn decode(&self, buf: &[u8]) -> Result<NodeRef, SerializerError> {
        decode_with(buf, &self.executor, self.config.verify_references)
    }

    /// Write the encoded list to `sink`, then rewind the sink to its start.
    pub fn serialize<W>(&self, head: &NodeRef, sink: &mut W) -> Result<(), SerializerError>
    where
        W: Write + Seek,
    {
        let buffer = self.encode(head)?;
        sink.write_all(&buffer)?;
        sink.flush()?;
        sink.seek(SeekFrom::Start(0))?;
        debug!(bytes = buffer.len(), "Serialized list");
        Ok(())
    }

    /// Read every remaining byte of `source` and decode it.
    pub fn deserialize<R>(&self, source: &mut R) -> Result<NodeRef, SerializerError>
    where
        R: Read,
    {
        let mut buffer = Vec::new();
        source.read_to_end(&mut buffer)?;
        debug!(bytes = buffer.len(), "Deserializing list");
        self.decode(&buffer)
    }

    /// Clone the list starting at `head` into new nodes.
    pub fn deep_copy(&self, head: &NodeRef) -> Result<NodeRef, SerializerError> {
        deep_copy_with(head, &self.executor, self.config.verify_references)
    }
}

impl Default for ListSerializer {
    fn default() -> Self {
        Self::new()
    }
}
