//! Recording sessions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::{io::Write, sync::atomic::Ordering};

use car_if::chunk::ChunkSerialize;
use util::sync::{lock, read};

use super::Driver;
use crate::rec::{frame, FlushEntry, PipelineError, RecordingError, Sink, SinkId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An open recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    pub name: String,

    pub sink: SinkId,

    /// Number of camera frames skipped between recorded frames
    pub frameskip: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Driver {
    /// Start recording to `name`, `-` meaning standard output.
    ///
    /// The configuration is written to the sink before this returns. Fails without side effects
    /// if a recording is already in progress.
    pub fn start_recording(&self, name: &str, frameskip: u32) -> Result<(), RecordingError> {
        let mut session = lock(&self.recording);
        if session.is_some() {
            return Err(RecordingError::AlreadyRecording)
        }

        let mut sink = Sink::open(name)
            .map_err(|e| RecordingError::SinkOpen(name.into(), e))?;

        let config = *read(&self.config);
        let mut buf = vec![0u8; config.serialized_size()];
        config.serialize(&mut buf)?;
        sink.write_all(&buf)
            .and_then(|_| sink.flush())
            .map_err(RecordingError::ConfigWrite)?;

        let id = SinkId(self.next_sink_id.fetch_add(1, Ordering::Relaxed));
        self.pipeline.submit(FlushEntry::Attach(id, sink))?;

        self.frame.store(0, Ordering::Relaxed);
        *session = Some(RecordingSession {
            name: name.into(),
            sink: id,
            frameskip,
        });

        info!("Recording to {} (frameskip {})", name, frameskip);

        Ok(())
    }

    /// Stop recording, returning false if there was no recording in progress.
    ///
    /// The close entry is queued behind any frames still waiting to be written and this returns
    /// without waiting for them.
    pub fn stop_recording(&self) -> bool {
        let session = match lock(&self.recording).take() {
            Some(s) => s,
            None => return false
        };

        if let Err(e) = self.pipeline.submit(FlushEntry::Close(session.sink)) {
            warn!("Could not close recording {}: {}", session.name, e);
        }

        info!("Stopped recording {}", session.name);
        true
    }

    pub fn is_recording(&self) -> bool {
        lock(&self.recording).is_some()
    }

    /// The current recording, if any.
    pub fn recording(&self) -> Option<RecordingSession> {
        lock(&self.recording).clone()
    }

    /// Record the camera frame if recording and enough frames have been skipped.
    ///
    /// The frame is encoded outside the recording lock. If the recording is stopped meanwhile
    /// the frame lands behind the close entry and the writer drops it.
    pub(super) fn record_frame(&self, t: &DateTime<Utc>, image: &[u8], frame: u32) {
        if let Some(sink) = self.due_sink(frame) {
            self.queue_recording_data(sink, t, image);
        }
    }

    /// The sink to record frame number `frame` to, if it is due.
    fn due_sink(&self, frame: u32) -> Option<SinkId> {
        let session = lock(&self.recording);
        let s = session.as_ref().filter(|s| frame > s.frameskip)?;
        self.frame.store(0, Ordering::Relaxed);
        Some(s.sink)
    }

    /// Encode one frame and hand it to the pipeline.
    fn queue_recording_data(&self, sink: SinkId, t: &DateTime<Utc>, image: &[u8]) {
        let dynamics = self.state.dynamics();

        let buf = {
            let controller = lock(&self.controller);
            frame::encode_frame(t, &dynamics, &**controller, image, self.params.frame_width)
        };

        let buf = match buf {
            Ok(b) => b,
            Err(e) => {
                warn!("Could not encode frame: {}", e);
                return
            }
        };

        match self.pipeline.submit(FlushEntry::Data(sink, buf)) {
            Ok(()) => (),
            Err(PipelineError::QueueFull) => warn!("Flush queue full, dropping frame"),
            Err(e) => warn!("Could not queue frame: {}", e)
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop_recording();
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use super::super::test_util::*;
    use crate::{car_state::CarDynamics, rec::{reader::RecordedFrame, STDOUT_SINK_NAME}};
    use car_if::config::DriverConfig;
    use std::sync::{atomic::AtomicBool, Arc};

    #[test]
    fn test_start_writes_config() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("config");

        driver.start_recording(&path, 0).unwrap();
        assert!(driver.is_recording());
        assert_eq!(mocks.pipeline.attaches(), 1);

        // The configuration was written before start_recording returned
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(DriverConfig::from_chunk(&contents), Ok(driver.config()));

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_double_start() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("double");

        driver.start_recording(&path, 0).unwrap();
        assert!(matches!(
            driver.start_recording(&path, 3),
            Err(RecordingError::AlreadyRecording)
        ));
        assert!(driver.is_recording());
        assert_eq!(driver.recording().unwrap().frameskip, 0);
        assert_eq!(mocks.pipeline.attaches(), 1);

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_one_close_per_stop() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("close");

        assert!(!driver.stop_recording());
        assert_eq!(mocks.pipeline.closes(), 0);

        driver.start_recording(&path, 0).unwrap();
        assert!(driver.stop_recording());
        assert!(!driver.stop_recording());
        assert_eq!(mocks.pipeline.closes(), 1);

        // The sink can be reopened after closing
        driver.start_recording(&path, 0).unwrap();
        drop(driver);
        assert_eq!(mocks.pipeline.closes(), 2);

        let entries = mocks.pipeline.entries();
        assert_eq!(entries.last(), Some(&MockEntry::Close(SinkId(1))));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sink_open_failure() {
        let (driver, mocks) = test_driver();
        let path = std::env::temp_dir().join("no_such_dir_for_drive_rec").join("x.rec");

        assert!(matches!(
            driver.start_recording(&path.display().to_string(), 0),
            Err(RecordingError::SinkOpen(..))
        ));
        assert!(!driver.is_recording());
        assert_eq!(mocks.pipeline.attaches(), 0);
    }

    #[test]
    fn test_frameskip() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("frameskip");

        // Frames before the recording starts are never recorded
        driver.on_camera_frame(&[0; 16]);
        assert!(mocks.pipeline.frames().is_empty());

        driver.start_recording(&path, 2).unwrap();
        for _ in 0..9 {
            driver.on_camera_frame(&[0; 16]);
        }

        // Every third frame is recorded
        assert_eq!(mocks.pipeline.frames().len(), 3);
        driver.stop_recording();

        driver.on_camera_frame(&[0; 16]);
        assert_eq!(mocks.pipeline.frames().len(), 3);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_recorded_frame_contents() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("contents");
        let image: Vec<u8> = (0..16).collect();

        driver.state().update_dynamics(|d| {
            d.throttle = -5;
            d.wheel_v = 1.5;
        });
        driver.start_recording(&path, 0).unwrap();
        driver.on_camera_frame(&image);

        let frames = mocks.pipeline.frames();
        assert_eq!(frames.len(), 1);

        let frame = RecordedFrame::decode(&frames[0]).unwrap();
        assert_eq!(frame.car, CarDynamics {
            throttle: -5,
            wheel_v: 1.5,
            ..CarDynamics::default()
        });
        assert_eq!(frame.controller.tag, *b"CMck");
        assert_eq!(frame.width, driver.params().frame_width);
        assert_eq!(frame.image, &image[..]);

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_stdout_recording() {
        let (driver, mocks) = test_driver();

        driver.start_recording(STDOUT_SINK_NAME, 0).unwrap();
        assert!(driver.is_recording());
        assert_eq!(mocks.pipeline.attached_stdout(), vec![true]);

        driver.stop_recording();
        assert_eq!(mocks.pipeline.closes(), 1);
    }

    #[test]
    fn test_file_recording_is_not_stdout() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("not_stdout");

        driver.start_recording(&path, 0).unwrap();
        assert_eq!(mocks.pipeline.attached_stdout(), vec![false]);

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_encode_outside_recording_lock() {
        let (driver, mocks) = test_driver();
        let driver = Arc::new(driver);
        let path = temp_rec_path("unlocked");

        // Whether the recording lock was free while the controller was serialised
        let free = Arc::new(AtomicBool::new(false));
        {
            let driver = Arc::downgrade(&driver);
            let free = free.clone();
            mocks.controller.set_on_serialize(move || {
                if let Some(d) = driver.upgrade() {
                    free.store(d.recording.try_lock().is_ok(), Ordering::Relaxed);
                }
            });
        }

        driver.start_recording(&path, 0).unwrap();
        driver.on_camera_frame(&[0; 16]);
        assert_eq!(mocks.pipeline.frames().len(), 1);
        assert!(free.load(Ordering::Relaxed));

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_full_queue_drops_frame() {
        let (driver, mocks) = test_driver();
        let path = temp_rec_path("full");

        driver.start_recording(&path, 0).unwrap();
        mocks.pipeline.set_full(true);
        driver.on_camera_frame(&[0; 16]);
        assert!(mocks.pipeline.frames().is_empty());

        // Recording carries on once there is room again
        mocks.pipeline.set_full(false);
        driver.on_camera_frame(&[0; 16]);
        assert_eq!(mocks.pipeline.frames().len(), 1);
        assert!(driver.is_recording());

        driver.stop_recording();
        std::fs::remove_file(&path).unwrap();
    }
}
