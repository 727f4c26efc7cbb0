//! Relative volume over a bounded trailing window.
//!
//! RVOL = current volume / mean(window), where the window holds the most
//! recent `RVOL_WINDOW` volumes including the current bar. Until
//! `RVOL_MIN_SAMPLES` volumes have been seen the value is neutral (1.0).

use std::collections::VecDeque;

pub const RVOL_WINDOW: usize = 30;
pub const RVOL_MIN_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeVolume {
    window: VecDeque<f64>,
}

impl Default for RelativeVolume {
    fn default() -> Self {
        Self {
            window: VecDeque::with_capacity(RVOL_WINDOW),
        }
    }
}

impl RelativeVolume {
    pub fn update(&mut self, volume: f64) -> f64 {
        if self.window.len() == RVOL_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(volume);

        if self.window.len() < RVOL_MIN_SAMPLES {
            return 1.0;
        }
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        if mean <= 0.0 {
            return 1.0;
        }
        volume / mean
    }

    pub fn samples(&self) -> usize {
        self.window.len()
    }
}
