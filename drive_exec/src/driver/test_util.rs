//! Mock collaborators for testing the driver
//!
//! Every mock is a cheap handle onto shared state, so a test keeps a clone to script the mock
//! and inspect what the driver did with it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use nalgebra::Vector3;
use std::sync::{Arc, Mutex};

use car_if::{
    chunk::{self, ChunkError, ChunkSerialize, Tag, HEADER_LEN},
    config::{ConfigStore, ConfigStoreError, DriverConfig},
    ctrl::{Actuation, ControlInputs, Controller},
    eqpt::{
        car::{CarHw, WheelMotion},
        imu::{Imu, ImuSample},
    },
    input::{InputEvent, InputSource},
    loc::CeilingTracker,
    ui::Display,
};

use super::{Collaborators, Driver, Params};
use crate::{
    rec::{FlushEntry, PipelineError, RecordingPipeline, SinkId},
    sim::EmptyObstacleDetector,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const MOCK_CTRL_TAG: Tag = *b"CMck";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handles onto every mock given to the driver by [`test_driver`].
pub struct Mocks {
    pub imu: MockImu,
    pub input: MockInput,
    pub controller: MockController,
    pub store: MockStore,
    pub pipeline: MockPipeline,
    pub display: MockDisplay,
}

#[derive(Clone, Default)]
pub struct MockImu(Arc<Mutex<ImuSample>>);

#[derive(Clone, Default)]
pub struct MockInput(Arc<Mutex<Vec<InputEvent>>>);

#[derive(Clone, Default)]
pub struct MockController(Arc<Mutex<ControllerLog>>);

#[derive(Default)]
pub struct ControllerLog {
    /// Command returned by `get_control`, if unset the joystick is passed through.
    command: Option<Option<Actuation>>,
    location: [f32; 3],
    plans: usize,
    resets: usize,
    on_serialize: Option<Box<dyn Fn() + Send>>,
}

#[derive(Clone, Default)]
pub struct MockStore(Arc<Mutex<Option<DriverConfig>>>);

#[derive(Clone, Default)]
pub struct MockPipeline(Arc<Mutex<PipelineLog>>);

#[derive(Default)]
pub struct PipelineLog {
    entries: Vec<MockEntry>,
    full: bool,
}

/// What the mock pipeline received, with the sinks themselves dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    /// Attached sink and whether it was standard output
    Attach(SinkId, bool),
    Data(SinkId, Vec<u8>),
    Close(SinkId),
}

#[derive(Clone, Default)]
pub struct MockDisplay(Arc<Mutex<DisplayLog>>);

#[derive(Default)]
pub struct DisplayLog {
    statuses: Vec<(String, u16)>,
    configs: Vec<(usize, Vec<i16>)>,
    views: Vec<[f32; 3]>,
}

/// Car hardware logging every command.
#[derive(Default)]
pub struct MockCar {
    pub wheel: Option<WheelMotion>,
    pub controls: Vec<(u8, f32, f32)>,
}

/// Tracker moving the pose one unit along x on every update.
pub struct StepTracker;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a driver with default parameters and mock collaborators.
pub fn test_driver() -> (Driver, Mocks) {
    let mocks = Mocks {
        imu: MockImu::default(),
        input: MockInput::default(),
        controller: MockController::default(),
        store: MockStore::default(),
        pipeline: MockPipeline::default(),
        display: MockDisplay::default(),
    };

    let driver = Driver::new(Params::default(), Collaborators {
        tracker: Box::new(StepTracker),
        detector: Box::new(EmptyObstacleDetector::default()),
        imu: Box::new(mocks.imu.clone()),
        controller: Box::new(mocks.controller.clone()),
        config_store: Box::new(mocks.store.clone()),
        pipeline: Box::new(mocks.pipeline.clone()),
        input: Some(Box::new(mocks.input.clone())),
        display: Some(Box::new(mocks.display.clone())),
    });

    (driver, mocks)
}

/// A recording path unique to this test process.
pub fn temp_rec_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("drive_test_{}_{}.rec", name, std::process::id()))
        .display()
        .to_string()
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MockImu {
    pub fn set(&self, sample: ImuSample) {
        *self.0.lock().unwrap() = sample;
    }
}

impl Imu for MockImu {
    fn read_imu(&mut self) -> ImuSample {
        *self.0.lock().unwrap()
    }
}

impl MockInput {
    pub fn push(&self, event: InputEvent) {
        self.0.lock().unwrap().push(event);
    }
}

impl InputSource for MockInput {
    fn read_input(&mut self) -> Vec<InputEvent> {
        self.0.lock().unwrap().drain(..).collect()
    }
}

impl MockController {
    pub fn set_command(&self, command: Option<Actuation>) {
        self.0.lock().unwrap().command = Some(command);
    }

    pub fn last_location(&self) -> [f32; 3] {
        self.0.lock().unwrap().location
    }

    pub fn plans(&self) -> usize {
        self.0.lock().unwrap().plans
    }

    pub fn resets(&self) -> usize {
        self.0.lock().unwrap().resets
    }

    /// Run `f` every time the controller is serialised.
    pub fn set_on_serialize<F>(&self, f: F)
    where
        F: Fn() + Send + 'static
    {
        self.0.lock().unwrap().on_serialize = Some(Box::new(f));
    }
}

impl Controller for MockController {
    fn reset_state(&mut self) {
        self.0.lock().unwrap().resets += 1;
    }

    fn update_location(&mut self, _config: &DriverConfig, xytheta: &[f32; 3]) {
        self.0.lock().unwrap().location = *xytheta;
    }

    fn plan(&mut self, _config: &DriverConfig, _car_penalties: &[i32], _cone_penalties: &[i32]) {
        self.0.lock().unwrap().plans += 1;
    }

    fn update_state(
        &mut self,
        _config: &DriverConfig,
        _accel: &Vector3<f32>,
        _gyro: &Vector3<f32>,
        _wheel_v: f32,
        _dt: f32
    ) {}

    fn get_control(
        &mut self,
        _config: &DriverConfig,
        inputs: &ControlInputs,
        _current: Actuation
    ) -> Option<Actuation> {
        match self.0.lock().unwrap().command {
            Some(c) => c,
            None => Some(Actuation {
                throttle: inputs.js_throttle,
                steering: inputs.js_steering,
            })
        }
    }
}

impl ChunkSerialize for MockController {
    fn serialized_size(&self) -> usize {
        HEADER_LEN + 4
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        if let Some(ref f) = self.0.lock().unwrap().on_serialize {
            f();
        }

        let len = self.serialized_size();
        chunk::check_space(buf, len)?;
        chunk::write_header(buf, &MOCK_CTRL_TAG, len)?;
        LittleEndian::write_u32(&mut buf[HEADER_LEN..], self.plans() as u32);
        Ok(len)
    }
}

impl MockStore {
    pub fn set(&self, config: DriverConfig) {
        *self.0.lock().unwrap() = Some(config);
    }

    pub fn get(&self) -> Option<DriverConfig> {
        *self.0.lock().unwrap()
    }

    pub fn clear(&self) {
        *self.0.lock().unwrap() = None;
    }
}

impl ConfigStore for MockStore {
    fn load(&self) -> Result<DriverConfig, ConfigStoreError> {
        self.get().ok_or_else(|| ConfigStoreError::Io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "no stored configuration")
        ))
    }

    fn save(&self, config: &DriverConfig) -> Result<(), ConfigStoreError> {
        self.set(*config);
        Ok(())
    }
}

impl MockPipeline {
    /// Make the pipeline reject data as if its queue was full.
    pub fn set_full(&self, full: bool) {
        self.0.lock().unwrap().full = full;
    }

    pub fn entries(&self) -> Vec<MockEntry> {
        self.0.lock().unwrap().entries.clone()
    }

    pub fn attaches(&self) -> usize {
        self.entries().iter().filter(|e| matches!(e, MockEntry::Attach(..))).count()
    }

    /// For every attached sink, whether it was standard output.
    pub fn attached_stdout(&self) -> Vec<bool> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                MockEntry::Attach(_, stdout) => Some(stdout),
                _ => None
            })
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.entries().iter().filter(|e| matches!(e, MockEntry::Close(_))).count()
    }

    /// Buffers of every data entry accepted.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                MockEntry::Data(_, buf) => Some(buf),
                _ => None
            })
            .collect()
    }
}

impl RecordingPipeline for MockPipeline {
    fn submit(&self, entry: FlushEntry) -> Result<(), PipelineError> {
        let mut log = self.0.lock().unwrap();
        let entry = match entry {
            FlushEntry::Attach(id, sink) => MockEntry::Attach(id, sink.is_stdout()),
            FlushEntry::Data(id, buf) => {
                if log.full {
                    return Err(PipelineError::QueueFull)
                }
                MockEntry::Data(id, buf)
            },
            FlushEntry::Close(id) => MockEntry::Close(id),
        };
        log.entries.push(entry);
        Ok(())
    }
}

impl MockDisplay {
    pub fn statuses(&self) -> Vec<(String, u16)> {
        self.0.lock().unwrap().statuses.clone()
    }

    pub fn configs(&self) -> Vec<(usize, Vec<i16>)> {
        self.0.lock().unwrap().configs.clone()
    }

    pub fn ceiltrack_views(&self) -> Vec<[f32; 3]> {
        self.0.lock().unwrap().views.clone()
    }
}

impl Display for MockDisplay {
    fn update_status(&mut self, message: &str, color: u16) {
        self.0.lock().unwrap().statuses.push((message.into(), color));
    }

    fn update_config(&mut self, _names: &[&str], cursor: usize, values: &[i16]) {
        self.0.lock().unwrap().configs.push((cursor, values.to_vec()));
    }

    fn update_ceiltrack_view(
        &mut self,
        xytheta: &[f32; 3],
        _x_grid_m: f32,
        _y_grid_m: f32,
        _map_width_m: f32,
        _map_height_m: f32
    ) {
        self.0.lock().unwrap().views.push(*xytheta);
    }
}

impl MockCar {
    pub fn with_wheels(wheel: WheelMotion) -> Self {
        Self {
            wheel: Some(wheel),
            controls: Vec::new(),
        }
    }
}

impl CarHw for MockCar {
    fn wheel_motion(&mut self) -> Option<WheelMotion> {
        self.wheel
    }

    fn set_controls(&mut self, leds: u8, throttle: f32, steering: f32) {
        self.controls.push((leds, throttle, steering));
    }
}

impl CeilingTracker for StepTracker {
    fn update(
        &mut self,
        _image: &[u8],
        _threshold: u8,
        _x_grid: f32,
        _y_grid: f32,
        xytheta: &mut [f32; 3],
        _n_iter: u32,
        _coarse: bool
    ) {
        xytheta[0] += 1.0;
    }
}
