//! ATR (Average True Range) over the current session's bars.
//!
//! ATR(n) = mean of the last n true ranges. A true range needs the previous
//! close, so n true ranges need n+1 bars. With fewer bars the value falls back
//! to half the latest bar's range, floored at `ATR_FLOOR`.

use crate::domain::bar::Bar;

pub const ATR_FLOOR: f64 = 0.02;

pub fn average_true_range(bars: &[Bar], period: usize) -> f64 {
    let Some(last) = bars.last() else {
        return ATR_FLOOR;
    };
    if period == 0 || bars.len() < period + 1 {
        return fallback(last);
    }

    let start = bars.len() - period;
    let sum: f64 = (start..bars.len())
        .map(|i| bars[i].true_range(bars[i - 1].close))
        .sum();
    sum / period as f64
}

fn fallback(bar: &Bar) -> f64 {
    (0.5 * bar.range()).max(ATR_FLOOR)
}
