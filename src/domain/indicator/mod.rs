//! Session-scoped indicator tracking.
//!
//! [`IndicatorTracker`] owns one [`Session`] holding everything derived from
//! the current trading day's bars:
//! - `vwap`: cumulative volume-weighted average price
//! - `rvol`: relative volume over a bounded trailing window
//! - `atr`: average true range over today's bars
//! - `opening_range`: the ORB high/low and completion flag
//!
//! A change of bar date replaces the whole session; the finished day's bars
//! are kept as the previous session for gap checks.

pub mod atr;
pub mod opening_range;
pub mod rvol;
pub mod vwap;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::bar::Bar;
use atr::average_true_range;
use opening_range::OpeningRange;
use rvol::RelativeVolume;
use vwap::Vwap;

/// Indicator values after the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub vwap: f64,
    pub rvol: f64,
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub date: NaiveDate,
    pub bars: Vec<Bar>,
    pub opening_range: OpeningRange,
    vwap: Vwap,
    rvol: RelativeVolume,
}

impl Session {
    fn new(date: NaiveDate, session_open: NaiveTime, orb_minutes: u32) -> Self {
        Session {
            date,
            bars: Vec::new(),
            opening_range: OpeningRange::new(date, session_open, orb_minutes),
            vwap: Vwap::default(),
            rvol: RelativeVolume::default(),
        }
    }

    pub fn open_price(&self) -> Option<f64> {
        self.bars.first().map(|b| b.open)
    }

    pub fn high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorTracker {
    session_open: NaiveTime,
    orb_minutes: u32,
    atr_period: usize,
    session: Option<Session>,
    previous: Vec<Bar>,
}

impl IndicatorTracker {
    pub fn new(session_open: NaiveTime, orb_minutes: u32, atr_period: usize) -> Self {
        Self {
            session_open,
            orb_minutes,
            atr_period,
            session: None,
            previous: Vec::new(),
        }
    }

    /// Fold one bar into the session and return the updated indicators.
    ///
    /// Returns `true` in the second slot when the bar started a new session.
    pub fn update(&mut self, bar: &Bar) -> (IndicatorSnapshot, bool) {
        let date = bar.date();
        let new_session = self.session.as_ref().is_none_or(|s| s.date != date);
        if new_session {
            let fresh = Session::new(date, self.session_open, self.orb_minutes);
            if let Some(finished) = self.session.replace(fresh) {
                self.previous = finished.bars;
            }
        }

        let atr_period = self.atr_period;
        let session = self.session_mut(date);
        session.bars.push(bar.clone());
        session.opening_range.update(bar);
        let vwap = session.vwap.update(bar);
        let rvol = session.rvol.update(bar.volume);
        let atr = average_true_range(&session.bars, atr_period);

        (IndicatorSnapshot { vwap, rvol, atr }, new_session)
    }

    fn session_mut(&mut self, date: NaiveDate) -> &mut Session {
        let (open, minutes) = (self.session_open, self.orb_minutes);
        self.session
            .get_or_insert_with(|| Session::new(date, open, minutes))
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn today(&self) -> &[Bar] {
        self.session.as_ref().map_or(&[], |s| s.bars.as_slice())
    }

    pub fn previous_day(&self) -> &[Bar] {
        &self.previous
    }

    pub fn opening_range(&self) -> Option<&OpeningRange> {
        self.session.as_ref().map(|s| &s.opening_range)
    }
}
