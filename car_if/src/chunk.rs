//! # Chunk headers
//!
//! Recordings are a stream of IFF-like chunks. Each chunk starts with an 8 byte header: a 4 byte
//! ASCII tag followed by a little-endian `u32` length. The length is the total size of the chunk
//! *including* the header, so a container's length is its header, its fixed fields and the sum
//! of its nested chunks' lengths.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use std::convert::TryFrom;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of a chunk header in bytes.
pub const HEADER_LEN: usize = 8;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Four character chunk tag.
pub type Tag = [u8; 4];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An object which can write itself into a buffer as one complete chunk.
pub trait ChunkSerialize {
    /// Total number of bytes `serialize` will write, header included.
    fn serialized_size(&self) -> usize;

    /// Write the chunk into the start of `buf`, returning the number of bytes written.
    ///
    /// The returned size is always equal to `serialized_size()`.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, ChunkError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Buffer too small for chunk: need {needed} bytes but only {available} available")]
    BufferTooSmall {
        needed: usize,
        available: usize
    },

    #[error("Chunk of {0} bytes cannot be described by a 32 bit length field")]
    TooLong(usize),

    #[error("Chunk {tag:?} declares length {len} which is invalid for the {available} bytes available")]
    InvalidLength {
        tag: Tag,
        len: u32,
        available: usize
    },

    #[error("Expected a {expected:?} chunk but found {found:?}")]
    UnexpectedTag {
        expected: Tag,
        found: Tag
    },

    #[error("Chunk {0:?} has the wrong payload size ({1} bytes)")]
    WrongPayloadSize(Tag, usize),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that `buf` can hold `needed` bytes.
pub fn check_space(buf: &[u8], needed: usize) -> Result<(), ChunkError> {
    if buf.len() < needed {
        Err(ChunkError::BufferTooSmall {
            needed,
            available: buf.len()
        })
    }
    else {
        Ok(())
    }
}

/// Write a chunk header for a chunk of `total_len` bytes (header included).
pub fn write_header(buf: &mut [u8], tag: &Tag, total_len: usize) -> Result<(), ChunkError> {
    let len = u32::try_from(total_len).map_err(|_| ChunkError::TooLong(total_len))?;
    check_space(buf, HEADER_LEN)?;

    buf[0..4].copy_from_slice(tag);
    LittleEndian::write_u32(&mut buf[4..8], len);

    Ok(())
}

/// Read a chunk header from the start of `buf`, returning the tag and declared length.
///
/// The length is checked against the available bytes, so on success `buf[..len]` is the whole
/// chunk.
pub fn read_header(buf: &[u8]) -> Result<(Tag, usize), ChunkError> {
    check_space(buf, HEADER_LEN)?;

    let mut tag: Tag = [0; 4];
    tag.copy_from_slice(&buf[0..4]);
    let len = LittleEndian::read_u32(&buf[4..8]);

    if (len as usize) < HEADER_LEN || (len as usize) > buf.len() {
        return Err(ChunkError::InvalidLength {
            tag,
            len,
            available: buf.len()
        })
    }

    Ok((tag, len as usize))
}

/// Read the header and check the tag matches `expected`, returning the chunk's payload.
pub fn expect_chunk<'a>(buf: &'a [u8], expected: &Tag) -> Result<&'a [u8], ChunkError> {
    let (tag, len) = read_header(buf)?;

    if &tag != expected {
        return Err(ChunkError::UnexpectedTag {
            expected: *expected,
            found: tag
        })
    }

    Ok(&buf[HEADER_LEN..len])
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
