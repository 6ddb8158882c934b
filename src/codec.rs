//! Binary node codec.
//!
//! One record per node, little-endian, no padding:
//!
//! ```text
//! u64 current | u64 next | u64 random | u32 payload_len | payload (UTF-8)
//! ```
//!
//! `next` and `random` are `0` when absent. Records are self-delimiting, so
//! a buffer is just records laid back to back.

use std::str::Utf8Error;

use crate::identity::IdAssigner;
use crate::types::{NodeId, NodeRef};

/// Size of the fixed part of a record: three ids and the payload length.
pub const HEADER_LEN: usize = 3 * 8 + 4;

/// Malformed or unencodable record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The buffer ends before the declared field or payload does.
    #[error("Record at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        /// Start of the record.
        offset: usize,
        /// Bytes the record declares.
        needed: usize,
        /// Bytes left in the buffer from `offset`.
        available: usize,
    },
    /// The record's own identifier is zero.
    #[error("Record at offset {offset} has no node identifier")]
    MissingNodeId {
        /// Start of the record.
        offset: usize,
    },
    /// The payload is not valid UTF-8.
    #[error("Record at offset {offset} carries an invalid UTF-8 payload")]
    InvalidUtf8 {
        /// Start of the record.
        offset: usize,
        /// Underlying decode failure.
        #[source]
        source: Utf8Error,
    },
    /// The payload does not fit the 32-bit length field.
    #[error("Payload of {len} bytes exceeds the record limit")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
    },
}

/// One node as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Identifier of the node this record defines.
    pub current: NodeId,
    /// Identifier of its successor.
    pub next: Option<NodeId>,
    /// Identifier of its random target.
    pub random: Option<NodeId>,
    /// Text payload.
    pub data: String,
}

impl Record {
    /// Describe `node` with identifiers from `ids`.
    pub fn from_node(node: &NodeRef, ids: &IdAssigner) -> Self {
        Self {
            current: ids.assign(node),
            next: ids.id_of(node.next().as_ref()),
            random: ids.id_of(node.random().as_ref()),
            data: node.data(),
        }
    }

    /// Exact number of bytes [`encode`](Self::encode) produces.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Append the encoded record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let payload = self.data.as_bytes();
        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::PayloadTooLarge { len: payload.len() })?;

        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.current.get().to_le_bytes());
        out.extend_from_slice(&NodeId::to_wire(self.next).to_le_bytes());
        out.extend_from_slice(&NodeId::to_wire(self.random).to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(payload);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decode the record starting at `offset`.
    ///
    /// Returns the record and the number of bytes it occupies.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), CodecError> {
        let available = buf.len().saturating_sub(offset);
        let truncated = |needed: usize| CodecError::Truncated {
            offset,
            needed,
            available,
        };

        let header = offset
            .checked_add(HEADER_LEN)
            .and_then(|end| buf.get(offset..end))
            .ok_or_else(|| truncated(HEADER_LEN))?;

        let current = NodeId::new(read_u64(header, 0))
            .ok_or(CodecError::MissingNodeId { offset })?;
        let next = NodeId::new(read_u64(header, 8));
        let random = NodeId::new(read_u64(header, 16));
        let payload_len = read_u32(header, 24) as usize;

        let byte_size = HEADER_LEN
            .checked_add(payload_len)
            .ok_or_else(|| truncated(usize::MAX))?;
        let payload = buf
            .get(offset + HEADER_LEN..)
            .and_then(|rest| rest.get(..payload_len))
            .ok_or_else(|| truncated(byte_size))?;
        let data = std::str::from_utf8(payload)
            .map_err(|source| CodecError::InvalidUtf8 { offset, source })?
            .to_owned();

        Ok((
            Self {
                current,
                next,
                random,
                data,
            },
            byte_size,
        ))
    }
}

// `header` is always HEADER_LEN bytes long here.
fn read_u64(header: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&header[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn read_u32(header: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&header[at..at + 4]);
    u32::from_le_bytes(bytes)
}

/// Lazy front-to-back scan over the records of a buffer.
///
/// Yields `(offset, record)` pairs. After the first error the iterator is
/// exhausted.
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    /// Start scanning `buf` at offset 0.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<(usize, Record), CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }
        let offset = self.offset;
        match Record::decode(self.buf, offset) {
            Ok((record, byte_size)) => {
                self.offset += byte_size;
                Some(Ok((offset, record)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Scan the records of `buf`.
pub fn records(buf: &[u8]) -> RecordIter<'_> {
    RecordIter::new(buf)
}
