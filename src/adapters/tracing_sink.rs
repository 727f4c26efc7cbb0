//! Event sink that renders rule trails and transitions as log events.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::domain::position::Transition;
use crate::domain::rule::RuleCheck;
use crate::ports::event_sink_port::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

/// One line per check, e.g. `[PASS] gap: ... | [FAIL] rvol: ...`.
pub fn render_checks(checks: &[RuleCheck]) -> String {
    checks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl EventSink for TracingEventSink {
    fn rule_checks(&self, symbol: &str, timestamp: NaiveDateTime, checks: &[RuleCheck]) {
        let passed = !checks.is_empty() && checks.iter().all(|c| c.passed);
        if passed {
            info!(symbol = %symbol, at = %timestamp, "entry signal: {}", render_checks(checks));
        } else {
            debug!(symbol = %symbol, at = %timestamp, "rules: {}", render_checks(checks));
        }
    }

    fn transition(&self, t: &Transition) {
        info!(
            symbol = %t.symbol,
            at = %t.timestamp,
            kind = %t.kind,
            quantity = t.quantity,
            price = t.price,
            "{}",
            t.note
        );
    }
}
