//! [`ColorZoneSensor`] – reduces a camera frame to per-zone target-color
//! match ratios.
//!
//! The frame is split into three vertical zones (left / middle / right).
//! Each zone's ratio is the fraction of its own pixels classified as the
//! target color, so a narrow side zone saturates just as readily as the
//! wider middle.

use roam_hal::camera::{Camera, CameraFrame};
use roam_types::RoamError;

use crate::classify::Palette;
use crate::sensor::Sensor;

/// Fraction of pixels matching the target color in each vertical zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRatios {
    pub left: f32,
    pub middle: f32,
    pub right: f32,
}

impl ZoneRatios {
    /// The largest of the three ratios.
    pub fn max(&self) -> f32 {
        self.left.max(self.middle).max(self.right)
    }
}

/// Memoizing adapter over a raw [`Camera`], classifying frames against a
/// named target color.
pub struct ColorZoneSensor {
    camera: Box<dyn Camera>,
    palette: Palette,
    target: usize,
    ratios: Option<ZoneRatios>,
}

impl std::fmt::Debug for ColorZoneSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorZoneSensor")
            .field("target", &self.target)
            .field("ratios", &self.ratios)
            .finish_non_exhaustive()
    }
}

impl ColorZoneSensor {
    /// Wrap a raw camera, resolving `target_color` against the standard
    /// palette.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::UnknownColor`] for a name the palette does not
    /// know — a fatal misconfiguration, surfaced before the loop starts.
    pub fn new(camera: Box<dyn Camera>, target_color: &str) -> Result<Self, RoamError> {
        let palette = Palette::standard();
        let target = palette.index_of(target_color)?;
        Ok(Self {
            camera,
            palette,
            target,
            ratios: None,
        })
    }

    /// The memoized zone ratios, or `None` before the first update of the
    /// tick.
    pub fn zones(&self) -> Option<ZoneRatios> {
        self.ratios
    }

    fn zone_ratios(&self, frame: &CameraFrame) -> ZoneRatios {
        let labels = self.palette.classify(frame);
        let width = frame.width as usize;
        let zone_width = width / 3;

        let mut matches = [0usize; 3];
        let mut totals = [0usize; 3];
        for (i, &label) in labels.iter().enumerate() {
            let x = i % width;
            let zone = if x < zone_width {
                0
            } else if x >= width - zone_width {
                2
            } else {
                1
            };
            totals[zone] += 1;
            if label == self.target {
                matches[zone] += 1;
            }
        }

        let ratio = |zone: usize| {
            if totals[zone] == 0 {
                0.0
            } else {
                matches[zone] as f32 / totals[zone] as f32
            }
        };
        ZoneRatios {
            left: ratio(0),
            middle: ratio(1),
            right: ratio(2),
        }
    }
}

impl Sensor for ColorZoneSensor {
    fn id(&self) -> &str {
        self.camera.id()
    }

    fn update(&mut self) -> Result<(), RoamError> {
        if self.ratios.is_none() {
            let frame = self.camera.capture()?;
            self.ratios = Some(self.zone_ratios(&frame));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.ratios = None;
    }

    fn has_reading(&self) -> bool {
        self.ratios.is_some()
    }
}
