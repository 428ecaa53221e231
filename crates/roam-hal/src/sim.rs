//! In-process simulated drivers for headless runs and CI.
//!
//! Each `Sim*` driver implements its capability trait without touching any
//! physical hardware: sensors replay a scripted sequence of readings
//! (repeating the final entry once the script runs out) and the motor driver
//! records every primitive call into a shared [`CallLog`] that tests can
//! inspect after the driver has been boxed away.
//!
//! # Example
//!
//! ```rust
//! use roam_hal::adapter::MotorAdapter;
//! use roam_hal::sim::{MotorCall, SimMotors};
//! use roam_types::{DriveDirection, MotorCommand};
//!
//! let motors = SimMotors::new("drive_base");
//! let log = motors.recorder();
//! let mut adapter = MotorAdapter::new(motors);
//!
//! adapter
//!     .dispatch(&MotorCommand::Drive {
//!         direction: DriveDirection::Forward,
//!         speed: 0.3,
//!     })
//!     .unwrap();
//! assert_eq!(log.last(), Some(MotorCall::Forward(0.3)));
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roam_types::RoamError;

use crate::button::StartGate;
use crate::camera::{Camera, CameraFrame};
use crate::motors::MotorDriver;
use crate::range::RangeFinder;
use crate::reflectance::{REFLECTANCE_CHANNELS, ReflectanceArray};

// ────────────────────────────────────────────────────────────────────────────
// Motor call recording
// ────────────────────────────────────────────────────────────────────────────

/// One primitive call received by [`SimMotors`].
#[derive(Debug, Clone, PartialEq)]
pub enum MotorCall {
    Forward(f32),
    Backward(f32),
    Left {
        speed: f32,
        duration: Option<Duration>,
    },
    Right {
        speed: f32,
        duration: Option<Duration>,
    },
    Set {
        left_speed: f32,
        right_speed: f32,
        duration: Duration,
    },
    Stop,
}

/// Shared, clonable view of every call a [`SimMotors`] driver has received.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<MotorCall>>>);

impl CallLog {
    fn push(&self, call: MotorCall) {
        self.0.lock().expect("call log poisoned").push(call);
    }

    /// All recorded calls, oldest first.
    pub fn snapshot(&self) -> Vec<MotorCall> {
        self.0.lock().expect("call log poisoned").clone()
    }

    /// The most recent call, if any.
    pub fn last(&self) -> Option<MotorCall> {
        self.0.lock().expect("call log poisoned").last().cloned()
    }

    /// Total number of recorded calls.
    pub fn len(&self) -> usize {
        self.0.lock().expect("call log poisoned").len()
    }

    /// `true` when no call has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_matching(&self, predicate: impl Fn(&MotorCall) -> bool) -> usize {
        self.0
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|c| predicate(c))
            .count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub motors
// ────────────────────────────────────────────────────────────────────────────

/// A simulated drive base that records every primitive call.  Always
/// succeeds.
pub struct SimMotors {
    id: String,
    log: CallLog,
}

impl SimMotors {
    /// Create a new simulated drive base with the given identifier.
    pub fn new(id: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            log: CallLog::default(),
        })
    }

    /// A handle onto this driver's call log, usable after the driver has
    /// been moved into an adapter.
    pub fn recorder(&self) -> CallLog {
        self.log.clone()
    }
}

impl MotorDriver for SimMotors {
    fn id(&self) -> &str {
        &self.id
    }

    fn forward(&mut self, speed: f32) -> Result<(), RoamError> {
        self.log.push(MotorCall::Forward(speed));
        Ok(())
    }

    fn backward(&mut self, speed: f32) -> Result<(), RoamError> {
        self.log.push(MotorCall::Backward(speed));
        Ok(())
    }

    fn left(&mut self, speed: f32, duration: Option<Duration>) -> Result<(), RoamError> {
        self.log.push(MotorCall::Left { speed, duration });
        Ok(())
    }

    fn right(&mut self, speed: f32, duration: Option<Duration>) -> Result<(), RoamError> {
        self.log.push(MotorCall::Right { speed, duration });
        Ok(())
    }

    fn set(
        &mut self,
        left_speed: f32,
        right_speed: f32,
        duration: Duration,
    ) -> Result<(), RoamError> {
        self.log.push(MotorCall::Set {
            left_speed,
            right_speed,
            duration,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RoamError> {
        self.log.push(MotorCall::Stop);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub range finder
// ────────────────────────────────────────────────────────────────────────────

/// Distance reported once a scripted range finder runs out of readings.
const DEFAULT_RANGE_CM: f32 = 200.0;

/// A simulated range finder that replays a scripted list of distances, then
/// repeats the final entry.  Always succeeds.
pub struct SimRangeFinder {
    id: String,
    script: VecDeque<f32>,
    last: f32,
}

impl SimRangeFinder {
    /// Create a scripted range finder.  An empty script reports a far,
    /// obstacle-free distance on every read.
    pub fn new(id: impl Into<String>, script: Vec<f32>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            script: script.into(),
            last: DEFAULT_RANGE_CM,
        })
    }
}

impl RangeFinder for SimRangeFinder {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_distance(&mut self) -> Result<f32, RoamError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub reflectance bank
// ────────────────────────────────────────────────────────────────────────────

/// A simulated reflectance bank that replays scripted samples, then repeats
/// the final entry.  An empty script reports a line-free floor.
pub struct SimReflectanceArray {
    id: String,
    script: VecDeque<[f32; REFLECTANCE_CHANNELS]>,
    last: [f32; REFLECTANCE_CHANNELS],
}

impl SimReflectanceArray {
    /// Create a scripted reflectance bank.
    pub fn new(id: impl Into<String>, script: Vec<[f32; REFLECTANCE_CHANNELS]>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            script: script.into(),
            last: [0.0; REFLECTANCE_CHANNELS],
        })
    }
}

impl ReflectanceArray for SimReflectanceArray {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&mut self) -> Result<[f32; REFLECTANCE_CHANNELS], RoamError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera that replays scripted frames, then repeats the final
/// frame.  An empty script yields a small black frame.
pub struct SimCamera {
    id: String,
    script: VecDeque<CameraFrame>,
    last: CameraFrame,
}

impl SimCamera {
    /// Create a scripted camera.
    pub fn new(id: impl Into<String>, script: Vec<CameraFrame>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            script: script.into(),
            last: CameraFrame::solid(32, 24, (0, 0, 0)),
        })
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, RoamError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub start gate
// ────────────────────────────────────────────────────────────────────────────

/// A start gate that confirms immediately.  Headless runs have no operator.
#[derive(Default)]
pub struct SimStartGate;

impl StartGate for SimStartGate {
    fn wait_for_start(&mut self) -> Result<(), RoamError> {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
