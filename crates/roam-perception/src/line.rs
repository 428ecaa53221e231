//! [`LineBoundarySensor`] – reduces a reflectance bank sample to the span of
//! elements currently over the line.

use roam_hal::reflectance::{REFLECTANCE_CHANNELS, ReflectanceArray};
use roam_types::RoamError;

use crate::sensor::Sensor;

/// Calibrated reflectance value at or above which an element counts as
/// "over the line".
const ON_LINE_THRESHOLD: f32 = 0.5;

/// The span of triggered elements in one reflectance sample, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBoundary {
    /// Index of the first (leftmost) triggered element.
    pub first: usize,
    /// Index of the last (rightmost) triggered element.
    pub last: usize,
}

/// Memoizing adapter over a raw [`ReflectanceArray`].
pub struct LineBoundarySensor {
    array: Box<dyn ReflectanceArray>,
    raw: Option<[f32; REFLECTANCE_CHANNELS]>,
}

impl LineBoundarySensor {
    /// Wrap a raw reflectance bank.
    pub fn new(array: Box<dyn ReflectanceArray>) -> Self {
        Self { array, raw: None }
    }

    /// Number of elements in the underlying bank.
    pub fn channel_count(&self) -> usize {
        REFLECTANCE_CHANNELS
    }

    /// The boundary derived from the memoized sample: `None` when no
    /// reading is memoized or no element crosses the threshold.
    pub fn boundary(&self) -> Option<LineBoundary> {
        let raw = self.raw.as_ref()?;
        let first = raw.iter().position(|&v| v >= ON_LINE_THRESHOLD)?;
        let last = raw.iter().rposition(|&v| v >= ON_LINE_THRESHOLD)?;
        Some(LineBoundary { first, last })
    }
}

impl Sensor for LineBoundarySensor {
    fn id(&self) -> &str {
        self.array.id()
    }

    fn update(&mut self) -> Result<(), RoamError> {
        if self.raw.is_none() {
            self.raw = Some(self.array.read()?);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.raw = None;
    }

    fn has_reading(&self) -> bool {
        self.raw.is_some()
    }
}
