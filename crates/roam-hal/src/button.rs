//! [`StartGate`] – blocking run confirmation.
//!
//! The controller never starts actuating on power-up; something must confirm
//! that the robot is placed and the operator is ready.  On real hardware this
//! is a physical push button, headless runs use a console prompt or the
//! immediate simulated gate.

use roam_types::RoamError;

/// A blocking "wait until the operator confirms" capability, consulted
/// exactly once before the control loop begins.
pub trait StartGate {
    /// Block until the operator confirms the run.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::HardwareFault`] if the confirmation source
    /// becomes unavailable (e.g. stdin closed, button GPIO fault).
    fn wait_for_start(&mut self) -> Result<(), RoamError>;
}
