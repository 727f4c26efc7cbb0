//! Bar and news item representations.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// One fixed-interval OHLCV sample for a single instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub timestamp: NaiveDateTime,
    pub headline: String,
    pub source: String,
}

impl NewsItem {
    /// Case-insensitive substring search over the headline. Returns the first
    /// keyword that matches.
    pub fn matching_keyword<'a>(&self, keywords: &'a [String]) -> Option<&'a str> {
        let headline = self.headline.to_lowercase();
        keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty())
            .find(|k| headline.contains(&k.trim().to_lowercase()))
    }
}
