//! Strategy file validation.
//!
//! Every key of the `[strategy]` section is checked before a
//! [`StrategyConfig`](crate::domain::strategy::StrategyConfig) is built. The
//! first violation is reported.

use std::ops::RangeInclusive;

use chrono::NaiveTime;

use crate::domain::error::HunterError;
use crate::domain::rule::RuleKind;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "strategy";

pub const ORB_MINUTES: RangeInclusive<i64> = 1..=1440;
pub const ATR_PERIODS: RangeInclusive<i64> = 1..=1000;
pub const NEWS_TIMEOUT_MS: RangeInclusive<i64> = 1..=60_000;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), HunterError> {
    validate_symbol(config)?;
    validate_risk(config)?;
    validate_thresholds(config)?;
    validate_news(config)?;
    validate_scale_outs(config)?;
    validate_atr(config)?;
    validate_session_times(config)?;
    validate_rules(config)?;
    validate_news_timeout(config)?;
    Ok(())
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Comma-separated list with blanks dropped.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_rules(value: &str) -> Result<Vec<RuleKind>, HunterError> {
    parse_list(value)
        .iter()
        .map(|name| {
            name.parse::<RuleKind>()
                .map_err(|reason| HunterError::invalid(SECTION, "rules", reason))
        })
        .collect()
}

fn non_blank(config: &dyn ConfigPort, key: &str) -> Option<String> {
    config
        .get_string(SECTION, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_f64(config: &dyn ConfigPort, key: &str) -> Result<f64, HunterError> {
    match non_blank(config, key) {
        None => Err(HunterError::missing(SECTION, key)),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| HunterError::invalid(SECTION, key, format!("'{}' is not a number", s))),
    }
}

fn optional_f64(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, HunterError> {
    match non_blank(config, key) {
        None => Ok(default),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| HunterError::invalid(SECTION, key, format!("'{}' is not a number", s))),
    }
}

fn optional_int(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, HunterError> {
    match non_blank(config, key) {
        None => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| HunterError::invalid(SECTION, key, format!("'{}' is not an integer", s))),
    }
}

fn int_in_range(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
    range: RangeInclusive<i64>,
) -> Result<(), HunterError> {
    let value = optional_int(config, key, default)?;
    if !range.contains(&value) {
        return Err(HunterError::invalid(
            SECTION,
            key,
            format!("{} must be between {} and {}", key, range.start(), range.end()),
        ));
    }
    Ok(())
}

fn optional_bool(config: &dyn ConfigPort, key: &str, default: bool) -> Result<bool, HunterError> {
    match non_blank(config, key) {
        None => Ok(default),
        Some(s) => parse_bool(&s)
            .ok_or_else(|| HunterError::invalid(SECTION, key, format!("'{}' is not a boolean", s))),
    }
}

fn optional_time(
    config: &dyn ConfigPort,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, HunterError> {
    match non_blank(config, key) {
        None => Ok(default),
        Some(s) => parse_time(&s).ok_or_else(|| {
            HunterError::invalid(SECTION, key, format!("'{}' is not a time, expected HH:MM", s))
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), HunterError> {
    match non_blank(config, "symbol") {
        Some(s) if s.contains(char::is_whitespace) => Err(HunterError::invalid(
            SECTION,
            "symbol",
            "symbol must not contain whitespace",
        )),
        Some(_) => Ok(()),
        None => Err(HunterError::missing(SECTION, "symbol")),
    }
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), HunterError> {
    let budget = required_f64(config, "risk_budget")?;
    if !(budget > 0.0) {
        return Err(HunterError::invalid(
            SECTION,
            "risk_budget",
            "risk_budget must be positive",
        ));
    }
    let attempt = required_f64(config, "risk_per_attempt")?;
    if !(attempt > 0.0) {
        return Err(HunterError::invalid(
            SECTION,
            "risk_per_attempt",
            "risk_per_attempt must be positive",
        ));
    }
    if attempt > budget {
        return Err(HunterError::invalid(
            SECTION,
            "risk_per_attempt",
            "risk_per_attempt must not exceed risk_budget",
        ));
    }
    let fx = optional_f64(config, "fx_rate", 1.0)?;
    if fx <= 0.0 {
        return Err(HunterError::invalid(SECTION, "fx_rate", "fx_rate must be positive"));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), HunterError> {
    for key in ["min_gap_pct", "min_rvol"] {
        if optional_f64(config, key, 0.0)? < 0.0 {
            return Err(HunterError::invalid(
                SECTION,
                key,
                format!("{} must be non-negative", key),
            ));
        }
    }
    int_in_range(config, "orb_minutes", 15, ORB_MINUTES)?;
    Ok(())
}

fn validate_news(config: &dyn ConfigPort) -> Result<(), HunterError> {
    let required = optional_bool(config, "require_news", false)?;
    let keywords = config
        .get_string(SECTION, "news_keywords")
        .map(|s| parse_list(&s))
        .unwrap_or_default();
    if required && keywords.is_empty() {
        return Err(HunterError::invalid(
            SECTION,
            "news_keywords",
            "news_keywords must list at least one keyword when require_news is set",
        ));
    }
    Ok(())
}

fn validate_scale_outs(config: &dyn ConfigPort) -> Result<(), HunterError> {
    let r1 = optional_f64(config, "scale_out_r1", 1.0)?;
    if r1 <= 0.0 {
        return Err(HunterError::invalid(
            SECTION,
            "scale_out_r1",
            "scale_out_r1 must be positive",
        ));
    }
    let r2 = optional_f64(config, "scale_out_r2", 2.0)?;
    if r2 <= r1 {
        return Err(HunterError::invalid(
            SECTION,
            "scale_out_r2",
            "scale_out_r2 must be greater than scale_out_r1",
        ));
    }
    Ok(())
}

fn validate_atr(config: &dyn ConfigPort) -> Result<(), HunterError> {
    int_in_range(config, "atr_period", 14, ATR_PERIODS)?;
    if optional_f64(config, "atr_multiplier", 1.5)? <= 0.0 {
        return Err(HunterError::invalid(
            SECTION,
            "atr_multiplier",
            "atr_multiplier must be positive",
        ));
    }
    optional_bool(config, "eod_time_stop", true)?;
    Ok(())
}

fn validate_session_times(config: &dyn ConfigPort) -> Result<(), HunterError> {
    let defaults = StrategyConfig::default();
    let open = optional_time(config, "session_open", defaults.session_open)?;
    let close = optional_time(config, "session_close", defaults.session_close)?;
    if close <= open {
        return Err(HunterError::invalid(
            SECTION,
            "session_close",
            "session_close must be after session_open",
        ));
    }
    let start = optional_time(config, "entry_start", open)?;
    let end = optional_time(config, "entry_end", close)?;
    if end < start {
        return Err(HunterError::invalid(
            SECTION,
            "entry_end",
            "entry_end must not be before entry_start",
        ));
    }
    Ok(())
}

fn validate_rules(config: &dyn ConfigPort) -> Result<(), HunterError> {
    let Some(raw) = config.get_string(SECTION, "rules") else {
        return Ok(());
    };
    if parse_rules(&raw)?.is_empty() {
        return Err(HunterError::invalid(
            SECTION,
            "rules",
            "rules must name at least one predicate",
        ));
    }
    Ok(())
}

fn validate_news_timeout(config: &dyn ConfigPort) -> Result<(), HunterError> {
    int_in_range(config, "news_timeout_ms", 250, NEWS_TIMEOUT_MS)?;
    Ok(())
}
