//! Session VWAP accumulator.
//!
//! VWAP = sum(close * volume) / sum(volume), cumulative from session start.
//! With zero cumulative volume the bar's close is reported instead.

use crate::domain::bar::Bar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vwap {
    price_volume: f64,
    volume: f64,
}

impl Vwap {
    pub fn update(&mut self, bar: &Bar) -> f64 {
        self.price_volume += bar.close * bar.volume;
        self.volume += bar.volume;
        self.value_or(bar.close)
    }

    pub fn value_or(&self, fallback: f64) -> f64 {
        if self.volume > 0.0 {
            self.price_volume / self.volume
        } else {
            fallback
        }
    }
}
