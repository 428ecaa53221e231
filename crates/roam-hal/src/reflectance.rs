//! Generic `ReflectanceArray` trait for downward-facing line sensor banks.

use roam_types::RoamError;

/// Number of elements in the reflectance bank.
pub const REFLECTANCE_CHANNELS: usize = 6;

/// A fixed-width bank of downward-facing reflectance elements.
///
/// Readings are calibrated to `[0, 1]` per element, where higher values mean
/// darker ground (a line under the element).  Calibration is the driver's
/// concern and happens before the first `read`.
pub trait ReflectanceArray: Send {
    /// Stable identifier for this bank, e.g. `"reflectance_bank"`.
    fn id(&self) -> &str;

    /// Sample all elements at once, left to right.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::HardwareFault`] if the bank cannot be sampled.
    fn read(&mut self) -> Result<[f32; REFLECTANCE_CHANNELS], RoamError>;
}
