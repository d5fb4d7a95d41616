//! # Recorded frame encoding
//!
//! A recorded frame is a `CYCF` container holding the capture timestamp followed by three
//! nested chunks:
//!
//! ```text
//! CYCF len  sec:u32 usec:u32
//!     CSt1 len  <vehicle state>
//!     <ctl> len <controller state>
//!     Y420 len  width:u16 <pixels>
//! ```
//!
//! The whole frame is serialised into a single buffer of exactly the frame's size, which is then
//! handed to the recording pipeline.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};

use car_if::chunk::{self, ChunkError, ChunkSerialize, Tag, HEADER_LEN};
use crate::car_state::CarDynamics;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tag of the frame container.
pub const FRAME_TAG: Tag = *b"CYCF";

/// Tag of the image chunk.
pub const IMAGE_TAG: Tag = *b"Y420";

/// Size of the timestamp fields in the frame container.
pub const TIMESTAMP_LEN: usize = 8;

/// Size of the width field in the image chunk.
pub const IMAGE_WIDTH_LEN: usize = 2;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Total size of the image chunk for `image_len` bytes of pixels.
pub fn image_chunk_len(image_len: usize) -> usize {
    HEADER_LEN + IMAGE_WIDTH_LEN + image_len
}

/// Total size of a frame.
pub fn frame_len<C>(car: &CarDynamics, controller: &C, image_len: usize) -> usize
where
    C: ChunkSerialize + ?Sized
{
    HEADER_LEN
        + TIMESTAMP_LEN
        + car.serialized_size()
        + controller.serialized_size()
        + image_chunk_len(image_len)
}

/// Serialise one frame into a newly allocated buffer of exactly the frame's size.
pub fn encode_frame<C>(
    timestamp: &DateTime<Utc>,
    car: &CarDynamics,
    controller: &C,
    image: &[u8],
    width: u16
) -> Result<Vec<u8>, ChunkError>
where
    C: ChunkSerialize + ?Sized
{
    let total = frame_len(car, controller, image.len());
    let mut buf = vec![0u8; total];

    chunk::write_header(&mut buf, &FRAME_TAG, total)?;
    let mut pos = HEADER_LEN;

    // Timestamps before 1970 aren't representable, clamp them to the epoch
    let secs = timestamp.timestamp().max(0) as u32;
    LittleEndian::write_u32(&mut buf[pos..], secs);
    LittleEndian::write_u32(&mut buf[pos + 4..], timestamp.timestamp_subsec_micros());
    pos += TIMESTAMP_LEN;

    pos += car.serialize(&mut buf[pos..])?;
    pos += controller.serialize(&mut buf[pos..])?;

    let image_len = image_chunk_len(image.len());
    chunk::write_header(&mut buf[pos..], &IMAGE_TAG, image_len)?;
    LittleEndian::write_u16(&mut buf[pos + HEADER_LEN..], width);
    buf[pos + HEADER_LEN + IMAGE_WIDTH_LEN..pos + image_len].copy_from_slice(image);
    pos += image_len;

    debug_assert_eq!(pos, total);

    Ok(buf)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::ctrl::ManualController;
    use chrono::TimeZone;

    #[test]
    fn test_frame_lengths() {
        let timestamp = Utc.timestamp(1_600_000_000, 123_456_000);
        let car = CarDynamics::default();
        let controller = ManualController::new();
        let image = vec![7u8; 6 * 4 * 3 / 2];

        let buf = encode_frame(&timestamp, &car, &controller, &image, 6).unwrap();

        let ctrl_len = controller.serialized_size();
        let image_len = 8 + 2 + image.len();
        let total = 8 + 8 + 42 + ctrl_len + image_len;
        assert_eq!(buf.len(), total);

        // Container
        assert_eq!(&buf[0..4], b"CYCF");
        assert_eq!(LittleEndian::read_u32(&buf[4..]) as usize, total);
        assert_eq!(LittleEndian::read_u32(&buf[8..]), 1_600_000_000);
        assert_eq!(LittleEndian::read_u32(&buf[12..]), 123_456);

        // Vehicle state
        assert_eq!(&buf[16..20], b"CSt1");
        assert_eq!(LittleEndian::read_u32(&buf[20..]), 42);

        // Controller state
        let pos = 16 + 42;
        assert_eq!(LittleEndian::read_u32(&buf[pos + 4..]) as usize, ctrl_len);

        // Image
        let pos = pos + ctrl_len;
        assert_eq!(&buf[pos..pos + 4], b"Y420");
        assert_eq!(LittleEndian::read_u32(&buf[pos + 4..]) as usize, image_len);
        assert_eq!(LittleEndian::read_u16(&buf[pos + 8..]), 6);
        assert_eq!(&buf[pos + 10..], &image[..]);
    }

    #[test]
    fn test_encode_with_dyn_controller() {
        let timestamp = Utc.timestamp(0, 0);
        let controller: Box<dyn car_if::ctrl::Controller> = Box::new(ManualController::new());

        let buf = encode_frame(&timestamp, &CarDynamics::default(), &*controller, &[], 0).unwrap();
        assert_eq!(buf.len(), frame_len(&CarDynamics::default(), &*controller, 0));
    }
}
