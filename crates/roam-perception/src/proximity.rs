//! [`ProximitySensor`] – memoized distance to the nearest forward obstacle.

use roam_hal::range::RangeFinder;
use roam_types::RoamError;

use crate::sensor::Sensor;

/// Memoizing adapter over a raw [`RangeFinder`].
pub struct ProximitySensor {
    device: Box<dyn RangeFinder>,
    distance: Option<f32>,
}

impl ProximitySensor {
    /// Wrap a raw range finder.
    pub fn new(device: Box<dyn RangeFinder>) -> Self {
        Self {
            device,
            distance: None,
        }
    }

    /// The memoized distance in centimetres, or `None` before the first
    /// update of the tick.
    pub fn distance(&self) -> Option<f32> {
        self.distance
    }
}

impl Sensor for ProximitySensor {
    fn id(&self) -> &str {
        self.device.id()
    }

    fn update(&mut self) -> Result<(), RoamError> {
        if self.distance.is_none() {
            self.distance = Some(self.device.read_distance()?);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.distance = None;
    }

    fn has_reading(&self) -> bool {
        self.distance.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Range finder that counts raw reads.
    struct CountingRange {
        id: String,
        distance: f32,
        reads: Arc<AtomicUsize>,
    }

    impl RangeFinder for CountingRange {
        fn id(&self) -> &str {
            &self.id
        }

        fn read_distance(&mut self) -> Result<f32, RoamError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.distance)
        }
    }

    fn counting(distance: f32) -> (Box<CountingRange>, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            Box::new(CountingRange {
                id: "range_front".to_string(),
                distance,
                reads: Arc::clone(&reads),
            }),
            reads,
        )
    }

    #[test]
    fn update_is_idempotent_within_a_tick() {
        let (device, reads) = counting(25.0);
        let mut sensor = ProximitySensor::new(device);

        sensor.update().unwrap();
        sensor.update().unwrap();
        sensor.update().unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(sensor.distance(), Some(25.0));
    }

    #[test]
    fn reset_forces_a_fresh_read() {
        let (device, reads) = counting(25.0);
        let mut sensor = ProximitySensor::new(device);

        sensor.update().unwrap();
        sensor.reset();
        assert!(!sensor.has_reading());
        assert_eq!(sensor.distance(), None);

        sensor.update().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unset_before_first_update() {
        let (device, _) = counting(10.0);
        let sensor = ProximitySensor::new(device);
        assert!(!sensor.has_reading());
        assert_eq!(sensor.distance(), None);
    }
}
