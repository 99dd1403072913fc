//! Smoothed Offset Buffer
//!
//! Fixed-size circular buffer averaging the most recent head-bone offsets so animation noise
//! in the skeleton does not jitter the camera.

use glam::Vec3;

/// Default number of samples averaged.
pub const DEFAULT_OFFSET_SAMPLES: usize = 2;

/// Circular buffer of `Vec3` samples with a running average over the filled slots.
#[derive(Clone, Debug)]
pub struct SmoothedOffsetBuffer {
    samples: Vec<Vec3>,
    /// Slot written by the next push
    index: usize,
    /// Number of valid samples, grows to capacity then stays there
    count: usize,
}

impl Default for SmoothedOffsetBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_OFFSET_SAMPLES)
    }
}

impl SmoothedOffsetBuffer {
    /// Create an empty buffer. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![Vec3::ZERO; capacity.max(1)],
            index: 0,
            count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.samples.len()
    }

    /// Overwrite the oldest slot with `sample`.
    pub fn push(&mut self, sample: Vec3) {
        let capacity = self.samples.len();
        self.samples[self.index] = sample;
        self.index = (self.index + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Mean of the valid samples, or zero when empty.
    pub fn average(&self) -> Vec3 {
        if self.count == 0 {
            return Vec3::ZERO;
        }
        // Until the buffer wraps, the valid samples are exactly the first `count` slots
        let sum: Vec3 = self.samples[..self.count].iter().copied().sum();
        sum / self.count as f32
    }

    /// Forget every sample without releasing storage.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }
}
