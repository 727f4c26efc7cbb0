//! Entry rule model.
//!
//! This module defines the shared vocabulary for entry predicates:
//! - `RuleCheck`: the outcome of one predicate with a diagnostic detail
//! - `RuleContext`: everything a predicate may look at for the current bar
//! - `EntryRule`: the capability every predicate implements
//! - `RuleKind`: the named predicates a strategy file can select

use std::fmt;
use std::str::FromStr;

use crate::domain::bar::{Bar, NewsItem};
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::indicator::opening_range::OpeningRange;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl RuleCheck {
    pub fn pass(name: &str, detail: impl Into<String>) -> Self {
        RuleCheck {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: &str, detail: impl Into<String>) -> Self {
        RuleCheck {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }

    pub fn with(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        RuleCheck {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "[{}] {}: {}", mark, self.name, self.detail)
    }
}

/// Inputs visible to entry predicates for one bar.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub bar: &'a Bar,
    pub today: &'a [Bar],
    pub previous_day: &'a [Bar],
    pub news: Option<&'a NewsItem>,
    pub indicators: IndicatorSnapshot,
    pub opening_range: Option<&'a OpeningRange>,
}

/// A single side-effect-free entry predicate.
pub trait EntryRule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleCheck;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Gap,
    OpeningRangeBreakout,
    VwapAlignment,
    RelativeVolume,
    NewsConfirmation,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Gap,
        RuleKind::OpeningRangeBreakout,
        RuleKind::VwapAlignment,
        RuleKind::RelativeVolume,
        RuleKind::NewsConfirmation,
    ];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Gap => write!(f, "gap"),
            RuleKind::OpeningRangeBreakout => write!(f, "orb"),
            RuleKind::VwapAlignment => write!(f, "vwap"),
            RuleKind::RelativeVolume => write!(f, "rvol"),
            RuleKind::NewsConfirmation => write!(f, "news"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gap" => Ok(RuleKind::Gap),
            "orb" | "opening_range" | "opening_range_breakout" => {
                Ok(RuleKind::OpeningRangeBreakout)
            }
            "vwap" => Ok(RuleKind::VwapAlignment),
            "rvol" | "relative_volume" => Ok(RuleKind::RelativeVolume),
            "news" => Ok(RuleKind::NewsConfirmation),
            other => Err(format!("unknown rule '{}'", other)),
        }
    }
}
