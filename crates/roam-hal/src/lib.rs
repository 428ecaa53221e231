//! `roam-hal` – hardware abstraction layer.
//!
//! Narrow capability traits for every physical device the controller talks
//! to, plus the motor adapter that translates abstract
//! [`MotorCommand`][roam_types::MotorCommand]s into raw wheel primitives.
//! The rest of the stack only ever talks to the traits, so drivers can be
//! swapped (real hardware, simulation, test doubles) without touching any
//! decision logic.
//!
//! # Modules
//!
//! - [`motors`] – [`MotorDriver`][motors::MotorDriver]: raw directional wheel
//!   primitives (forward/backward/left/right/differential set/stop).
//! - [`adapter`] – [`MotorAdapter`][adapter::MotorAdapter]: maps an abstract
//!   command to concrete actuation bursts.
//! - [`range`] – [`RangeFinder`][range::RangeFinder]: forward-facing distance
//!   measurement (ultrasonic or infrared).
//! - [`reflectance`] – [`ReflectanceArray`][reflectance::ReflectanceArray]:
//!   fixed-width downward-facing reflectance sensor bank for line detection.
//! - [`camera`] – [`Camera`][camera::Camera] and
//!   [`CameraFrame`][camera::CameraFrame]: RGB image capture.
//! - [`button`] – [`StartGate`][button::StartGate]: blocking run confirmation
//!   consulted once before the control loop starts.
//! - [`sim`] – scripted stub drivers that record commands and replay queued
//!   readings for headless runs and CI.

pub mod adapter;
pub mod button;
pub mod camera;
pub mod motors;
pub mod range;
pub mod reflectance;
pub mod sim;

pub use adapter::MotorAdapter;
pub use button::StartGate;
pub use camera::{Camera, CameraFrame};
pub use motors::MotorDriver;
pub use range::RangeFinder;
pub use reflectance::{REFLECTANCE_CHANNELS, ReflectanceArray};
pub use sim::{
    CallLog, MotorCall, SimCamera, SimMotors, SimRangeFinder, SimReflectanceArray, SimStartGate,
};
