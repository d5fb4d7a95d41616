//! # Camera Equipment Interface
//!
//! The camera delivers raw YUV 4:2:0 planar frames through a callback on its own thread.

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Width of a camera frame in pixels.
pub const FRAME_WIDTH: u16 = 640;

/// Height of a camera frame in pixels.
pub const FRAME_HEIGHT: u16 = 480;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Size in bytes of a YUV 4:2:0 frame: a full resolution Y plane and quarter resolution U and V
/// planes.
pub fn yuv420_size(width: u16, height: u16) -> usize {
    let y = width as usize * height as usize;
    y + y / 2
}
