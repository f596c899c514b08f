// SPDX-License-Identifier: GPL-3.0-only

//! Bounded history of average-FPS samples
//!
//! Used only to derive a small frame-rate display in the hosting UI; there
//! is no correctness invariant beyond the bounded size.

use crate::constants::MAX_FPS_SAMPLES;
use std::collections::VecDeque;

/// Fixed-capacity, oldest-first history of frame-rate samples
#[derive(Debug, Clone)]
pub struct FpsSampleHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl FpsSampleHistory {
    /// Create a history with the default capacity ([`MAX_FPS_SAMPLES`])
    pub fn new() -> Self {
        Self::with_capacity(MAX_FPS_SAMPLES)
    }

    /// Create a history with a custom capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if the history is full
    pub fn push(&mut self, fps: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(fps);
    }

    /// Samples oldest-first, most recent last
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// The most recent sample, if any
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Mean of the retained samples
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for FpsSampleHistory {
    fn default() -> Self {
        Self::new()
    }
}
