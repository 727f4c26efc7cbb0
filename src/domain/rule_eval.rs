//! Entry rule evaluation.
//!
//! Each predicate is a small struct implementing [`EntryRule`]. A [`RuleSet`]
//! combines them with AND semantics.
//!
//! # Evaluation Semantics
//!
//! - Every predicate is evaluated, even after a failure, so the full trail is
//!   always available.
//! - Overall pass is the conjunction of every predicate's result.
//! - An empty rule set never passes.
//! - Degenerate inputs (no previous day, cold indicators, missing news)
//!   produce a failing or neutral check, never a panic.

use crate::domain::rule::{EntryRule, RuleCheck, RuleContext, RuleKind};
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone)]
pub struct GapRule {
    pub min_gap_pct: f64,
}

impl EntryRule for GapRule {
    fn name(&self) -> &str {
        "gap"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck {
        let Some(prev_high) = ctx.previous_day.iter().map(|b| b.high).reduce(f64::max) else {
            return RuleCheck::fail(self.name(), "no prior day data");
        };
        let Some(open) = ctx.today.first().map(|b| b.open) else {
            return RuleCheck::fail(self.name(), "no bars in current session");
        };

        let threshold = prev_high * (1.0 + self.min_gap_pct / 100.0);
        let gap_pct = if prev_high > 0.0 {
            (open / prev_high - 1.0) * 100.0
        } else {
            0.0
        };
        RuleCheck::with(
            self.name(),
            open >= threshold,
            format!(
                "open {:.4} vs prior high {:.4}: gap {:.2}% (min {:.2}%)",
                open, prev_high, gap_pct, self.min_gap_pct
            ),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OpeningRangeBreakoutRule;

impl EntryRule for OpeningRangeBreakoutRule {
    fn name(&self) -> &str {
        "orb"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck {
        let Some(orb) = ctx.opening_range else {
            return RuleCheck::fail(self.name(), "no session");
        };
        if !orb.is_complete() {
            return RuleCheck::fail(self.name(), "opening range still forming");
        }
        if orb.is_empty() {
            return RuleCheck::fail(self.name(), "opening range has no bars");
        }
        if orb.bars_after_close() == 0 {
            return RuleCheck::fail(self.name(), "no bar since opening range closed");
        }
        let high = orb.high();
        RuleCheck::with(
            self.name(),
            ctx.bar.high >= high,
            format!("bar high {:.4} vs range high {:.4}", ctx.bar.high, high),
        )
    }
}

#[derive(Debug, Clone)]
pub struct VwapAlignmentRule;

impl EntryRule for VwapAlignmentRule {
    fn name(&self) -> &str {
        "vwap"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck {
        let vwap = ctx.indicators.vwap;
        RuleCheck::with(
            self.name(),
            ctx.bar.close >= vwap,
            format!("close {:.4} vs vwap {:.4}", ctx.bar.close, vwap),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RelativeVolumeRule {
    pub min_rvol: f64,
}

impl EntryRule for RelativeVolumeRule {
    fn name(&self) -> &str {
        "rvol"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck {
        let rvol = ctx.indicators.rvol;
        RuleCheck::with(
            self.name(),
            rvol >= self.min_rvol,
            format!("rvol {:.2} (min {:.2})", rvol, self.min_rvol),
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewsConfirmationRule {
    pub required: bool,
    pub keywords: Vec<String>,
}

impl EntryRule for NewsConfirmationRule {
    fn name(&self) -> &str {
        "news"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck {
        if !self.required {
            return RuleCheck::pass(self.name(), "news not required");
        }
        let Some(item) = ctx.news else {
            return RuleCheck::fail(self.name(), "no news available");
        };
        match item.matching_keyword(&self.keywords) {
            Some(keyword) => RuleCheck::pass(
                self.name(),
                format!("'{}' matched in \"{}\" ({})", keyword, item.headline, item.source),
            ),
            None => RuleCheck::fail(
                self.name(),
                format!("no keyword in \"{}\" ({})", item.headline, item.source),
            ),
        }
    }
}

/// Outcome of one entry evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub passed: bool,
    pub checks: Vec<RuleCheck>,
}

impl Evaluation {
    pub fn failed(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// An ordered conjunction of entry predicates.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn EntryRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn EntryRule>>) -> Self {
        RuleSet { rules }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|kind| build_rule(*kind, config))
            .collect();
        RuleSet { rules }
    }

    pub fn push(&mut self, rule: Box<dyn EntryRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Evaluation {
        let checks: Vec<RuleCheck> = self.rules.iter().map(|r| r.evaluate(ctx)).collect();
        let passed = !checks.is_empty() && checks.iter().all(|c| c.passed);
        Evaluation { passed, checks }
    }
}

pub fn build_rule(kind: RuleKind, config: &StrategyConfig) -> Box<dyn EntryRule> {
    match kind {
        RuleKind::Gap => Box::new(GapRule {
            min_gap_pct: config.min_gap_pct,
        }),
        RuleKind::OpeningRangeBreakout => Box::new(OpeningRangeBreakoutRule),
        RuleKind::VwapAlignment => Box::new(VwapAlignmentRule),
        RuleKind::RelativeVolume => Box::new(RelativeVolumeRule {
            min_rvol: config.min_rvol,
        }),
        RuleKind::NewsConfirmation => Box::new(NewsConfirmationRule {
            required: config.require_news,
            keywords: config.news_keywords.clone(),
        }),
    }
}
