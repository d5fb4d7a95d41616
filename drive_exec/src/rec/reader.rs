//! # Recording reader
//!
//! Walks a recording chunk by chunk, validating every length field, and splits frame containers
//! back into their parts.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};

use car_if::chunk::{self, ChunkError, Tag, HEADER_LEN};
use super::frame::{FRAME_TAG, IMAGE_TAG, IMAGE_WIDTH_LEN, TIMESTAMP_LEN};
use crate::car_state::CarDynamics;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A chunk borrowed from a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    pub tag: Tag,

    /// The whole chunk, header included
    pub data: &'a [u8],
}

/// Iterates over consecutive chunks in a buffer.
///
/// Iteration stops after the first invalid chunk, which is returned as an error.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

/// A decoded `CYCF` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame<'a> {
    pub secs: u32,
    pub usecs: u32,
    pub car: CarDynamics,

    /// Controller state, left serialised
    pub controller: RawChunk<'a>,

    pub width: u16,
    pub image: &'a [u8],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> RawChunk<'a> {
    /// The chunk's contents after the header.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[HEADER_LEN..]
    }

    /// Read the chunk at the start of `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self, ChunkError> {
        let (tag, len) = chunk::read_header(buf)?;
        Ok(Self {
            tag,
            data: &buf[..len],
        })
    }
}

impl<'a> ChunkReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Offset of the next chunk.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None
        }

        match RawChunk::parse(&self.buf[self.pos..]) {
            Ok(c) => {
                self.pos += c.data.len();
                Some(Ok(c))
            },
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> RecordedFrame<'a> {
    /// Decode a frame container.
    pub fn decode(buf: &'a [u8]) -> Result<Self, ChunkError> {
        let payload = chunk::expect_chunk(buf, &FRAME_TAG)?;
        if payload.len() < TIMESTAMP_LEN {
            return Err(ChunkError::WrongPayloadSize(FRAME_TAG, payload.len()))
        }

        let secs = LittleEndian::read_u32(&payload[0..]);
        let usecs = LittleEndian::read_u32(&payload[4..]);

        let mut reader = ChunkReader::new(&payload[TIMESTAMP_LEN..]);
        let mut next = || -> Result<RawChunk<'a>, ChunkError> {
            match reader.next() {
                Some(c) => c,
                None => Err(ChunkError::WrongPayloadSize(FRAME_TAG, payload.len()))
            }
        };

        let car = CarDynamics::decode(next()?.data)?;
        let controller = next()?;

        let image_chunk = next()?;
        let image_payload = chunk::expect_chunk(image_chunk.data, &IMAGE_TAG)?;
        if image_payload.len() < IMAGE_WIDTH_LEN {
            return Err(ChunkError::WrongPayloadSize(IMAGE_TAG, image_payload.len()))
        }

        // Nothing may follow the image
        if next().is_ok() {
            return Err(ChunkError::WrongPayloadSize(FRAME_TAG, payload.len()))
        }

        Ok(Self {
            secs,
            usecs,
            car,
            controller,
            width: LittleEndian::read_u16(image_payload),
            image: &image_payload[IMAGE_WIDTH_LEN..],
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
