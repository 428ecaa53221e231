//! [`MotorAdapter`] – abstract command to concrete actuation.
//!
//! Each adapter wraps one [`MotorDriver`] and translates every
//! [`MotorCommand`] into the raw primitive calls that realise it.  The
//! command vocabulary is a closed enum, so the translation `match` is
//! exhaustive: there is no "unknown command" path to guard at runtime.
//!
//! # Translation
//!
//! | Command | Actuation |
//! |---|---|
//! | `Pivot { direction, angle }` | timed in-place rotation; duration = angle / 90° seconds at a fixed pivot speed |
//! | `SpinTurn { direction, drive, speed }` | differential burst with the inner wheel attenuated 5×, sign flipped for backward arcs |
//! | `Drive { direction, speed }` | straight forward/backward at `speed` |
//! | `Stop` | immediate halt, overriding any stored command |

use std::time::Duration;

use tracing::debug;

use roam_types::{DriveDirection, MotorCommand, RoamError, TurnDirection};

use crate::motors::MotorDriver;

/// Wheel speed used for timed pivot rotations.
const PIVOT_SPEED: f32 = 0.4;

/// A pivot through this many degrees takes one second.
const PIVOT_FULL_TURN_DEGREES: f32 = 90.0;

/// The inner wheel of a spin turn runs at `speed / SPIN_TURN_ATTENUATION`.
const SPIN_TURN_ATTENUATION: f32 = 5.0;

/// Length of one differential spin-turn burst.
const SPIN_TURN_DURATION: Duration = Duration::from_millis(500);

/// Translates abstract [`MotorCommand`]s into calls on one raw
/// [`MotorDriver`], remembering the most recent command for introspection.
pub struct MotorAdapter {
    driver: Box<dyn MotorDriver>,
    last_command: Option<MotorCommand>,
}

impl MotorAdapter {
    /// Wrap a raw driver.
    pub fn new(driver: Box<dyn MotorDriver>) -> Self {
        Self {
            driver,
            last_command: None,
        }
    }

    /// Identifier of the underlying drive base.
    pub fn id(&self) -> &str {
        self.driver.id()
    }

    /// The most recent command dispatched through this adapter, if any.
    pub fn last_command(&self) -> Option<&MotorCommand> {
        self.last_command.as_ref()
    }

    /// Translate `command` into raw primitive calls.
    ///
    /// # Errors
    ///
    /// Propagates [`RoamError::HardwareFault`] from the underlying driver;
    /// a failed actuation call invalidates the safety of continuing and is
    /// not retried.
    pub fn dispatch(&mut self, command: &MotorCommand) -> Result<(), RoamError> {
        debug!(driver = self.driver.id(), command = command.label(), "dispatching motor command");
        self.last_command = Some(command.clone());

        match command {
            MotorCommand::Stop => self.driver.stop(),

            MotorCommand::Pivot {
                direction,
                angle_degrees,
            } => {
                let duration = Duration::from_secs_f32(
                    (angle_degrees / PIVOT_FULL_TURN_DEGREES).max(0.0),
                );
                match direction {
                    TurnDirection::Left => self.driver.left(PIVOT_SPEED, Some(duration)),
                    TurnDirection::Right => self.driver.right(PIVOT_SPEED, Some(duration)),
                }
            }

            MotorCommand::SpinTurn {
                direction,
                drive,
                speed,
            } => {
                let outer = match drive {
                    DriveDirection::Forward => *speed,
                    DriveDirection::Backward => -speed,
                };
                let inner = outer / SPIN_TURN_ATTENUATION;
                match direction {
                    TurnDirection::Left => self.driver.set(inner, outer, SPIN_TURN_DURATION),
                    TurnDirection::Right => self.driver.set(outer, inner, SPIN_TURN_DURATION),
                }
            }

            MotorCommand::Drive { direction, speed } => match direction {
                DriveDirection::Forward => self.driver.forward(*speed),
                DriveDirection::Backward => self.driver.backward(*speed),
            },
        }
    }
}
