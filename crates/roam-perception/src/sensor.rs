//! The per-tick memoization contract shared by every sensor adapter.
//!
//! An adapter holds at most one reading per tick.  `update` performs a raw
//! hardware read only when no reading is memoized, so any number of callers
//! may invoke it within a tick and exactly one device access occurs.
//! `reset` clears the memo at the end of the tick, forcing a fresh read on
//! the next one.

use std::cell::RefCell;
use std::rc::Rc;

use roam_types::RoamError;

/// A per-tick-memoized sensor adapter.
///
/// The control loop is single-threaded; adapters are shared between the
/// controller's registry and the behaviours that consult them through
/// [`SensorRef`] handles.
pub trait Sensor {
    /// Stable identifier, unique within one controller.
    fn id(&self) -> &str;

    /// Perform a raw hardware read if no reading is memoized; otherwise a
    /// no-op.  Idempotent within a tick.
    ///
    /// # Errors
    ///
    /// Propagates [`RoamError::HardwareFault`] from the raw device; sensor
    /// failures are not retried.
    fn update(&mut self) -> Result<(), RoamError>;

    /// Clear the memoized reading back to unset.
    fn reset(&mut self);

    /// `true` while a reading is memoized for the current tick.
    fn has_reading(&self) -> bool;
}

/// Shared handle to a sensor adapter.
///
/// `Rc<RefCell<_>>` because the loop is strictly single-threaded: the
/// controller's update/reset passes and the behaviours' reads never overlap.
pub type SensorRef = Rc<RefCell<dyn Sensor>>;
