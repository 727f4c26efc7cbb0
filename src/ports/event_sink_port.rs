//! Diagnostic event sink port trait.

use chrono::NaiveDateTime;

use crate::domain::position::Transition;
use crate::domain::rule::RuleCheck;

pub trait EventSink: Send + Sync {
    /// Full rule trail for one entry evaluation.
    fn rule_checks(&self, symbol: &str, timestamp: NaiveDateTime, checks: &[RuleCheck]);

    fn transition(&self, transition: &Transition);
}
