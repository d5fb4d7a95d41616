//! # Recording
//!
//! Recordings are written by the [`flush_thread`] so that storage never stalls the real-time
//! loops. A recording starts with the driver configuration chunk, written synchronously when the
//! recording is started, followed by one [`frame`] container per recorded camera frame.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod flush_thread;
pub mod frame;
pub mod reader;
pub mod sink;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use flush_thread::{
    FlushEntry, FlushQueue, FlushStats, FlushThread, PipelineError, RecordingPipeline, SinkId
};
pub use sink::{Sink, STDOUT_SINK_NAME};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Could not open recording sink {0:?}: {1}")]
    SinkOpen(String, std::io::Error),

    #[error("Could not write the configuration to the recording: {0}")]
    ConfigWrite(std::io::Error),

    #[error("Could not serialize recording data: {0}")]
    Chunk(#[from] car_if::chunk::ChunkError),

    #[error("Recording pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}
