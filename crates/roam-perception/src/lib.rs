//! `roam-perception` – semantic sensor layer.
//!
//! Turns raw device readings into the semantic values behaviours reason
//! about, memoizing each reading so a sensor is sampled at most once per
//! control-loop tick no matter how many behaviours consult it.
//!
//! # Modules
//!
//! - [`sensor`] – [`Sensor`][sensor::Sensor]: the per-tick memoization
//!   contract (`update` is idempotent within a tick, `reset` clears back to
//!   unset) and the shared [`SensorRef`][sensor::SensorRef] handle.
//! - [`proximity`] – [`ProximitySensor`][proximity::ProximitySensor]:
//!   memoized distance to the nearest forward obstacle.
//! - [`line`] – [`LineBoundarySensor`][line::LineBoundarySensor]: reduces a
//!   reflectance bank sample to the first/last triggered element pair.
//! - [`color`] – [`ColorZoneSensor`][color::ColorZoneSensor]: reduces a
//!   camera frame to per-zone (left/middle/right) target-color match ratios.
//! - [`classify`] – [`Palette`][classify::Palette]: named colors and
//!   winner-take-all per-pixel classification.

pub mod classify;
pub mod color;
pub mod line;
pub mod proximity;
pub mod sensor;

pub use classify::{Palette, Rgb};
pub use color::{ColorZoneSensor, ZoneRatios};
pub use line::{LineBoundary, LineBoundarySensor};
pub use proximity::ProximitySensor;
pub use sensor::{Sensor, SensorRef};
