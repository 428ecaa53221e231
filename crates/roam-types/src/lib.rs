use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which way a turning command rotates the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

/// Which way a linear command moves the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveDirection {
    Forward,
    Backward,
}

/// Strict definition of the motor actions a behaviour is allowed to
/// recommend.  The motor adapter translates these into raw wheel primitives;
/// because the set is a closed enum, an unknown command is a compile error
/// rather than a runtime fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params")]
pub enum MotorCommand {
    /// Halt all actuation immediately, overriding any stored command.
    Stop,
    /// Rotate in place toward `direction` for a duration derived from the
    /// requested angle.
    Pivot {
        direction: TurnDirection,
        angle_degrees: f32,
    },
    /// Differential turn: the wheel on the inside of the turn is attenuated.
    /// `drive` selects a forward or backward arc.
    SpinTurn {
        direction: TurnDirection,
        drive: DriveDirection,
        speed: f32,
    },
    /// Drive straight forward or backward at `speed`.
    Drive {
        direction: DriveDirection,
        speed: f32,
    },
}

impl MotorCommand {
    /// Short stable label for logs and telemetry.
    pub fn label(&self) -> &'static str {
        match self {
            MotorCommand::Stop => "stop",
            MotorCommand::Pivot { .. } => "pivot",
            MotorCommand::SpinTurn { .. } => "spin_turn",
            MotorCommand::Drive { .. } => "drive",
        }
    }
}

/// Outcome of one control-loop tick, suitable for structured logging.
///
/// Produced by the controller after arbitration so tests and operators can
/// observe which behaviour won and what was actually dispatched to the
/// motors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSummary {
    /// Monotonic tick counter, starting at 0.
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    /// Name of the behaviour whose recommendation won arbitration.
    /// `None` when no behaviour was active this tick.
    pub winner: Option<String>,
    /// The winning behaviour's weight (match degree × priority).
    pub weight: Option<f32>,
    /// The command dispatched to the motor adapters this tick, if any.
    pub command: Option<MotorCommand>,
    /// `true` once the loop has reached its terminal halted state.
    pub halted: bool,
}

/// Global error type spanning hardware failures and configuration mistakes.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum RoamError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    /// An unrecoverable misconfiguration: the requested goal color is not in
    /// the palette.  Surfaced at configuration time, never at runtime.
    #[error("Unknown color name '{name}' (known colors: {known})")]
    UnknownColor { name: String, known: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}
