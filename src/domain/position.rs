//! Position and exit state machine.
//!
//! `Flat → Open → Flat`. While open the position walks through two one-shot
//! scale-outs, a VWAP trailing stop that only ever ratchets up, a hard stop
//! and an optional end-of-day time stop.
//!
//! Per-bar order: hard stop, scale-out 1, scale-out 2, trailing stop, time
//! stop. A full exit ends processing for that bar.

use chrono::{NaiveDateTime, NaiveTime};
use std::fmt;

use crate::domain::bar::Bar;
use crate::domain::indicator::opening_range::OpeningRange;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Entry,
    ScaleOut1,
    ScaleOut2,
    TrailStop,
    HardStop,
    TimeStop,
}

impl TransitionKind {
    pub fn is_exit(self) -> bool {
        matches!(self, TransitionKind::HardStop | TransitionKind::TimeStop)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Entry => write!(f, "ENTRY"),
            TransitionKind::ScaleOut1 => write!(f, "SCALE_OUT_1"),
            TransitionKind::ScaleOut2 => write!(f, "SCALE_OUT_2"),
            TransitionKind::TrailStop => write!(f, "TRAIL_STOP"),
            TransitionKind::HardStop => write!(f, "HARD_STOP"),
            TransitionKind::TimeStop => write!(f, "TIME_STOP"),
        }
    }
}

/// One position state change, as reported to the broker and event sink.
///
/// For `TrailStop` the quantity is the remaining size and the price is the
/// new stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub quantity: u64,
    pub price: f64,
    pub note: String,
}

/// Exit thresholds pulled from the strategy configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitPolicy {
    pub scale_out_r1: f64,
    pub scale_out_r2: f64,
    pub eod_time_stop: bool,
    pub time_stop_at: NaiveTime,
}

impl From<&StrategyConfig> for ExitPolicy {
    fn from(config: &StrategyConfig) -> Self {
        ExitPolicy {
            scale_out_r1: config.scale_out_r1,
            scale_out_r2: config.scale_out_r2,
            eod_time_stop: config.eod_time_stop,
            time_stop_at: config.time_stop_at(),
        }
    }
}

/// Initial protective stop: the lower of the ATR stop and the structure stop
/// (opening-range low once the range is complete, otherwise the bar's low).
///
/// Taking the minimum can select the wider of the two distances.
pub fn initial_stop(
    close: f64,
    atr: f64,
    atr_multiplier: f64,
    opening_range: Option<&OpeningRange>,
    bar_low: f64,
) -> f64 {
    let atr_stop = close - atr_multiplier * atr;
    let structure_stop = match opening_range {
        Some(orb) if orb.is_complete() && !orb.is_empty() => orb.low(),
        _ => bar_low,
    };
    atr_stop.min(structure_stop)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub opened_at: NaiveDateTime,
    pub entry_price: f64,
    pub stop_price: f64,
    pub risk_per_share: f64,
    pub original_quantity: u64,
    pub quantity: u64,
    pub sold_scale_1: u64,
    pub sold_scale_2: u64,
    pub scale_1_fired: bool,
    pub scale_2_fired: bool,
    pub realized_pnl: f64,
}

impl Position {
    pub fn open(
        symbol: &str,
        opened_at: NaiveDateTime,
        entry_price: f64,
        stop_price: f64,
        quantity: u64,
    ) -> Self {
        Position {
            symbol: symbol.to_string(),
            opened_at,
            entry_price,
            stop_price,
            risk_per_share: entry_price - stop_price,
            original_quantity: quantity,
            quantity,
            sold_scale_1: 0,
            sold_scale_2: 0,
            scale_1_fired: false,
            scale_2_fired: false,
            realized_pnl: 0.0,
        }
    }

    /// Unrealized gain as a multiple of the initial risk per share.
    pub fn r_multiple(&self, price: f64) -> f64 {
        if self.risk_per_share <= 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.risk_per_share
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }

    fn scale_quantity(&self) -> u64 {
        (self.original_quantity / 3).min(self.quantity)
    }

    fn sell(&mut self, quantity: u64, price: f64) {
        self.quantity -= quantity;
        self.realized_pnl += quantity as f64 * (price - self.entry_price);
    }

    fn transition(
        &self,
        kind: TransitionKind,
        bar: &Bar,
        quantity: u64,
        price: f64,
        note: String,
    ) -> Transition {
        Transition {
            kind,
            symbol: self.symbol.clone(),
            timestamp: bar.timestamp,
            quantity,
            price,
            note,
        }
    }

    /// Apply one bar to the open position.
    ///
    /// Returns the transitions in the order they happened. When the last one
    /// is an exit, the position is fully closed and should be dropped.
    pub fn on_bar(&mut self, bar: &Bar, vwap: f64, policy: &ExitPolicy) -> Vec<Transition> {
        let mut out = Vec::new();

        if bar.low <= self.stop_price {
            let qty = self.quantity;
            let price = self.stop_price;
            self.sell(qty, price);
            out.push(self.transition(
                TransitionKind::HardStop,
                bar,
                qty,
                price,
                format!("low {:.4} touched stop {:.4}", bar.low, price),
            ));
            return out;
        }

        let r = self.r_multiple(bar.close);
        if !self.scale_1_fired && r >= policy.scale_out_r1 {
            self.scale_1_fired = true;
            let qty = self.scale_quantity();
            if qty > 0 {
                self.sell(qty, bar.close);
                self.sold_scale_1 += qty;
                out.push(self.transition(
                    TransitionKind::ScaleOut1,
                    bar,
                    qty,
                    bar.close,
                    format!("{:.2}R reached (target {:.2}R)", r, policy.scale_out_r1),
                ));
            }
        }
        if !self.scale_2_fired && r >= policy.scale_out_r2 {
            self.scale_2_fired = true;
            let qty = self.scale_quantity();
            if qty > 0 {
                self.sell(qty, bar.close);
                self.sold_scale_2 += qty;
                out.push(self.transition(
                    TransitionKind::ScaleOut2,
                    bar,
                    qty,
                    bar.close,
                    format!("{:.2}R reached (target {:.2}R)", r, policy.scale_out_r2),
                ));
            }
        }

        if bar.close > vwap && vwap > self.stop_price {
            let previous = self.stop_price;
            self.stop_price = vwap;
            out.push(self.transition(
                TransitionKind::TrailStop,
                bar,
                self.quantity,
                vwap,
                format!("stop raised {:.4} -> {:.4}", previous, vwap),
            ));
        }

        if policy.eod_time_stop && bar.time() >= policy.time_stop_at {
            let qty = self.quantity;
            self.sell(qty, bar.close);
            out.push(self.transition(
                TransitionKind::TimeStop,
                bar,
                qty,
                bar.close,
                format!("end of day at {}", bar.time().format("%H:%M")),
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn make_bar(h: u32, m: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: at(h, m),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn policy() -> ExitPolicy {
        ExitPolicy {
            scale_out_r1: 1.0,
            scale_out_r2: 2.0,
            eod_time_stop: true,
            time_stop_at: NaiveTime::from_hms_opt(16, 29, 0).unwrap(),
        }
    }

    fn sample_position(quantity: u64) -> Position {
        Position::open("VOD", at(9, 0), 10.00, 9.70, quantity)
    }

    #[test]
    fn open_records_risk_per_share() {
        let pos = sample_position(300);
        assert_relative_eq!(pos.risk_per_share, 0.30, epsilon = 1e-9);
        assert_eq!(pos.quantity, 300);
        assert_eq!(pos.original_quantity, 300);
        assert!(!pos.scale_1_fired && !pos.scale_2_fired);
    }

    #[test]
    fn r_multiple() {
        let pos = sample_position(300);
        assert_relative_eq!(pos.r_multiple(10.30), 1.0, epsilon = 1e-9);
        assert_relative_eq!(pos.r_multiple(9.85), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn quiet_bar_changes_nothing() {
        let mut pos = sample_position(300);
        let before = pos.clone();
        let out = pos.on_bar(&make_bar(9, 1, 10.05, 9.95, 10.00), 10.10, &policy());
        assert!(out.is_empty());
        assert_eq!(pos, before);
    }

    #[test]
    fn scale_out_at_one_r_then_hard_stop() {
        let mut pos = sample_position(300);

        // VWAP below the stop keeps the trailing stop out of the way.
        let out = pos.on_bar(&make_bar(10, 0, 10.31, 10.20, 10.30), 9.50, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::ScaleOut1);
        assert_eq!(out[0].quantity, 100);
        assert_eq!(pos.quantity, 200);
        assert_eq!(pos.sold_scale_1, 100);

        let out = pos.on_bar(&make_bar(11, 0, 9.90, 9.70, 9.75), 9.50, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::HardStop);
        assert_eq!(out[0].quantity, 200);
        assert_relative_eq!(out[0].price, 9.70, epsilon = 1e-9);
        assert_eq!(pos.quantity, 0);
        // +0.30 * 100 - 0.30 * 200
        assert_relative_eq!(pos.realized_pnl, -30.0, epsilon = 1e-6);
    }

    #[test]
    fn scale_outs_fire_once_each() {
        let mut pos = sample_position(100);
        let out = pos.on_bar(&make_bar(10, 0, 10.31, 10.25, 10.30), 9.0, &policy());
        assert_eq!(out[0].quantity, 33);
        let out = pos.on_bar(&make_bar(10, 1, 10.35, 10.25, 10.32), 9.0, &policy());
        assert!(out.is_empty(), "scale-out 1 must not repeat");

        let out = pos.on_bar(&make_bar(10, 2, 10.70, 10.50, 10.65), 9.0, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::ScaleOut2);
        assert_eq!(out[0].quantity, 33);
        let out = pos.on_bar(&make_bar(10, 3, 10.95, 10.60, 10.90), 9.0, &policy());
        assert!(out.is_empty());
        assert_eq!(pos.quantity, 34);
    }

    #[test]
    fn both_scale_outs_can_fire_on_one_bar() {
        let mut pos = sample_position(90);
        let out = pos.on_bar(&make_bar(10, 0, 10.80, 10.40, 10.70), 9.0, &policy());
        let kinds: Vec<_> = out.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TransitionKind::ScaleOut1, TransitionKind::ScaleOut2]);
        assert_eq!(pos.quantity, 30);
    }

    #[test]
    fn tiny_position_scale_sells_nothing() {
        let mut pos = sample_position(2);
        let out = pos.on_bar(&make_bar(10, 0, 10.80, 10.40, 10.70), 9.0, &policy());
        assert!(out.is_empty());
        assert!(pos.scale_1_fired && pos.scale_2_fired);
        assert_eq!(pos.quantity, 2);
    }

    #[test]
    fn trailing_stop_raises_to_vwap() {
        let mut pos = sample_position(300);
        let out = pos.on_bar(&make_bar(10, 0, 10.10, 9.95, 10.05), 9.90, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::TrailStop);
        assert_relative_eq!(pos.stop_price, 9.90, epsilon = 1e-9);
    }

    #[test]
    fn trailing_stop_never_lowers() {
        let mut pos = sample_position(300);
        pos.on_bar(&make_bar(10, 0, 10.10, 9.95, 10.05), 9.90, &policy());
        let out = pos.on_bar(&make_bar(10, 1, 10.10, 9.95, 10.05), 9.80, &policy());
        assert!(out.is_empty());
        assert_relative_eq!(pos.stop_price, 9.90, epsilon = 1e-9);
    }

    #[test]
    fn trailing_stop_needs_close_above_vwap() {
        let mut pos = sample_position(300);
        let out = pos.on_bar(&make_bar(10, 0, 10.00, 9.85, 9.88), 9.90, &policy());
        assert!(out.is_empty());
        assert_relative_eq!(pos.stop_price, 9.70, epsilon = 1e-9);
    }

    #[test]
    fn hard_stop_wins_over_scale_out() {
        let mut pos = sample_position(300);
        let out = pos.on_bar(&make_bar(10, 0, 10.40, 9.60, 10.35), 9.0, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::HardStop);
        assert_eq!(out[0].quantity, 300);
    }

    #[test]
    fn time_stop_exits_in_last_minute() {
        let mut pos = sample_position(300);
        let out = pos.on_bar(&make_bar(16, 28, 10.10, 9.95, 10.05), 10.20, &policy());
        assert!(out.is_empty());

        let out = pos.on_bar(&make_bar(16, 29, 10.10, 9.95, 10.08), 10.20, &policy());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransitionKind::TimeStop);
        assert_eq!(out[0].quantity, 300);
        assert_relative_eq!(out[0].price, 10.08, epsilon = 1e-9);
        assert_eq!(pos.quantity, 0);
    }

    #[test]
    fn time_stop_disabled() {
        let mut pos = sample_position(300);
        let p = ExitPolicy {
            eod_time_stop: false,
            ..policy()
        };
        let out = pos.on_bar(&make_bar(16, 29, 10.10, 9.95, 10.08), 10.20, &p);
        assert!(out.is_empty());
        assert_eq!(pos.quantity, 300);
    }

    #[test]
    fn initial_stop_uses_bar_low_before_range_completes() {
        // ATR stop 10.0 - 1.5 * 0.2 = 9.7, bar low 9.8 → 9.7
        assert_relative_eq!(initial_stop(10.0, 0.2, 1.5, None, 9.8), 9.7, epsilon = 1e-9);
    }

    #[test]
    fn initial_stop_takes_literal_minimum() {
        let mut orb = OpeningRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            15,
        );
        orb.update(&make_bar(8, 0, 10.2, 9.0, 10.0));
        orb.update(&make_bar(8, 15, 10.2, 9.9, 10.1));
        // ATR stop 9.85 is tighter, but the lower range stop 9.0 is chosen.
        assert_relative_eq!(
            initial_stop(10.0, 0.1, 1.5, Some(&orb), 9.95),
            9.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn transition_kind_display() {
        assert_eq!(TransitionKind::ScaleOut1.to_string(), "SCALE_OUT_1");
        assert!(TransitionKind::TimeStop.is_exit());
        assert!(!TransitionKind::TrailStop.is_exit());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stop_never_decreases_and_scales_bounded(
                qty in 1u64..5000,
                moves in prop::collection::vec((-0.2f64..0.6, -0.3f64..0.3), 1..60),
            ) {
                let mut pos = sample_position(qty);
                let mut stop = pos.stop_price;
                let p = ExitPolicy { eod_time_stop: false, ..policy() };
                for (i, (close_off, vwap_off)) in moves.into_iter().enumerate() {
                    let close = 10.0 + close_off;
                    let bar = make_bar(10, (i % 60) as u32, close + 0.01, close - 0.01, close);
                    let out = pos.on_bar(&bar, close + vwap_off, &p);
                    if out.last().is_some_and(|t| t.kind.is_exit()) {
                        prop_assert_eq!(pos.quantity, 0);
                        break;
                    }
                    prop_assert!(pos.stop_price >= stop);
                    stop = pos.stop_price;
                    prop_assert!(pos.sold_scale_1 <= qty / 3);
                    prop_assert!(pos.sold_scale_2 <= qty / 3);
                    prop_assert_eq!(pos.quantity + pos.sold_scale_1 + pos.sold_scale_2, qty);
                }
            }
        }
    }
}
