//! Opening range (ORB) for one session.
//!
//! Bars stamped from session open up to (but excluding) `open + minutes` are
//! accumulated. The first bar at or after that boundary completes the range;
//! a completed range never accepts more bars.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::bar::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
    highs: Vec<f64>,
    lows: Vec<f64>,
    complete: bool,
    bars_after_close: usize,
}

impl OpeningRange {
    pub fn new(date: NaiveDate, session_open: NaiveTime, minutes: u32) -> Self {
        let start = date.and_time(session_open);
        Self {
            start,
            end: start + Duration::minutes(i64::from(minutes)),
            highs: Vec::new(),
            lows: Vec::new(),
            complete: false,
            bars_after_close: 0,
        }
    }

    pub fn update(&mut self, bar: &Bar) {
        if bar.timestamp >= self.end {
            self.complete = true;
            self.bars_after_close += 1;
            return;
        }
        if self.complete || bar.timestamp < self.start {
            return;
        }
        self.highs.push(bar.high);
        self.lows.push(bar.low);
    }

    pub fn high(&self) -> f64 {
        self.highs.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    pub fn low(&self) -> f64 {
        self.lows.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_empty(&self) -> bool {
        self.highs.is_empty()
    }

    pub fn bars_after_close(&self) -> usize {
        self.bars_after_close
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}
