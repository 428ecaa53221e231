//! Named color palette and winner-take-all pixel classification.
//!
//! Every pixel of a frame is assigned to the nearest palette color by squared
//! RGB distance.  The goal-seeking pipeline then only compares palette
//! indices, so the camera adapter never inspects raw pixel values itself.

use roam_hal::camera::CameraFrame;
use roam_types::RoamError;

/// A palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn distance_sq(&self, (r, g, b): (u8, u8, u8)) -> u32 {
        let dr = self.r as i32 - r as i32;
        let dg = self.g as i32 - g as i32;
        let db = self.b as i32 - b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// A named color palette with winner-take-all classification.
pub struct Palette {
    entries: Vec<(&'static str, Rgb)>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

impl Palette {
    /// The standard six-color palette.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ("red", Rgb::new(255, 0, 0)),
                ("green", Rgb::new(0, 255, 0)),
                ("blue", Rgb::new(0, 0, 255)),
                ("yellow", Rgb::new(255, 255, 0)),
                ("white", Rgb::new(255, 255, 255)),
                ("black", Rgb::new(0, 0, 0)),
            ],
        }
    }

    /// Resolve a color name to its palette index.
    ///
    /// # Errors
    ///
    /// Returns [`RoamError::UnknownColor`] listing the known names.  This is
    /// an unrecoverable misconfiguration and must be surfaced before the
    /// control loop starts.
    pub fn index_of(&self, name: &str) -> Result<usize, RoamError> {
        self.entries
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or_else(|| RoamError::UnknownColor {
                name: name.to_string(),
                known: self
                    .entries
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Classify every pixel of `frame` to its nearest palette index,
    /// row-major.
    pub fn classify(&self, frame: &CameraFrame) -> Vec<usize> {
        let mut labels = Vec::with_capacity((frame.width * frame.height) as usize);
        for y in 0..frame.height {
            for x in 0..frame.width {
                labels.push(self.nearest(frame.rgb(x, y)));
            }
        }
        labels
    }

    fn nearest(&self, pixel: (u8, u8, u8)) -> usize {
        let mut best = 0;
        let mut best_dist = u32::MAX;
        for (i, (_, color)) in self.entries.iter().enumerate() {
            let dist = color.distance_sq(pixel);
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }
}
