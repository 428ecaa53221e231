//! Generic `RangeFinder` trait for forward-facing distance sensors.

use roam_types::RoamError;

/// A single-beam distance sensor (ultrasonic, infrared, time-of-flight).
pub trait RangeFinder: Send {
    /// Stable identifier for this sensor, e.g. `"range_front"`.
    fn id(&self) -> &str;

    /// Measure and return the distance to the nearest obstacle in
    /// centimetres.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::HardwareFault`] if the measurement fails (e.g.
    /// echo timeout or a disconnected device).
    fn read_distance(&mut self) -> Result<f32, RoamError>;
}
