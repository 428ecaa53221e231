//! Generic `MotorDriver` trait for differential-drive wheel bases.
//!
//! Drivers implement this trait and are handed to a
//! [`MotorAdapter`][crate::adapter::MotorAdapter], which owns all command
//! translation.  Physical units and the exact meaning of a timed burst are
//! the driver's concern.

use std::time::Duration;

use roam_types::RoamError;

/// A raw differential-drive motor pair.
///
/// Speeds are normalised to `[-1, 1]` where `1.0` is full throttle.  Timed
/// variants run for `duration` and then coast; `None` means "until the next
/// command".
pub trait MotorDriver: Send {
    /// Stable identifier for this drive base, e.g. `"drive_base"`.
    fn id(&self) -> &str;

    /// Drive both wheels forward at `speed`.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::HardwareFault`] if the command cannot be applied.
    fn forward(&mut self, speed: f32) -> Result<(), RoamError>;

    /// Drive both wheels backward at `speed`.
    fn backward(&mut self, speed: f32) -> Result<(), RoamError>;

    /// Rotate in place to the left at `speed`, optionally for `duration`.
    fn left(&mut self, speed: f32, duration: Option<Duration>) -> Result<(), RoamError>;

    /// Rotate in place to the right at `speed`, optionally for `duration`.
    fn right(&mut self, speed: f32, duration: Option<Duration>) -> Result<(), RoamError>;

    /// Set each wheel independently for `duration`.  Negative speeds reverse
    /// the corresponding wheel.
    fn set(
        &mut self,
        left_speed: f32,
        right_speed: f32,
        duration: Duration,
    ) -> Result<(), RoamError>;

    /// Cut power to both wheels immediately.
    fn stop(&mut self) -> Result<(), RoamError>;
}
