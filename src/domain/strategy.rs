//! Strategy configuration.

use chrono::{Duration, NaiveTime};

use crate::domain::config_validation::{
    SECTION, parse_list, parse_rules, parse_time, validate_strategy_config,
};
use crate::domain::error::HunterError;
use crate::domain::rule::RuleKind;
use crate::ports::config_port::ConfigPort;

/// Every threshold one engine run needs. Built once by the loader and
/// treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub description: String,
    pub symbol: String,
    /// Total risk available to the run, in account currency.
    pub risk_budget: f64,
    /// Risk spent per entry attempt, in account currency.
    pub risk_per_attempt: f64,
    /// Account currency to instrument currency conversion rate.
    pub fx_rate: f64,
    pub min_gap_pct: f64,
    pub min_rvol: f64,
    pub orb_minutes: u32,
    pub require_news: bool,
    pub news_keywords: Vec<String>,
    pub scale_out_r1: f64,
    pub scale_out_r2: f64,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub eod_time_stop: bool,
    pub session_open: NaiveTime,
    pub session_close: NaiveTime,
    pub entry_start: NaiveTime,
    pub entry_end: NaiveTime,
    pub rules: Vec<RuleKind>,
    pub news_timeout_ms: u64,
}

impl StrategyConfig {
    pub fn in_entry_window(&self, time: NaiveTime) -> bool {
        time >= self.entry_start && time <= self.entry_end
    }

    /// The last minute before session close. Open positions are flattened
    /// on any bar at or after this time when the time stop is enabled.
    pub fn time_stop_at(&self) -> NaiveTime {
        self.session_close - Duration::minutes(1)
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            name: "Unnamed".to_string(),
            description: String::new(),
            symbol: String::new(),
            risk_budget: 1000.0,
            risk_per_attempt: 100.0,
            fx_rate: 1.0,
            min_gap_pct: 3.0,
            min_rvol: 2.0,
            orb_minutes: 15,
            require_news: false,
            news_keywords: Vec::new(),
            scale_out_r1: 1.0,
            scale_out_r2: 2.0,
            atr_period: 14,
            atr_multiplier: 1.5,
            eod_time_stop: true,
            session_open: hm(8, 0),
            session_close: hm(16, 30),
            entry_start: hm(8, 0),
            entry_end: hm(16, 30),
            rules: RuleKind::ALL.to_vec(),
            news_timeout_ms: 250,
        }
    }
}

/// Integer key already range-checked by validation.
fn int_key<T: TryFrom<i64>>(config: &dyn ConfigPort, key: &str, default: i64) -> Result<T, HunterError> {
    T::try_from(config.get_int(SECTION, key, default))
        .map_err(|_| HunterError::invalid(SECTION, key, "value out of range"))
}

/// Validate the `[strategy]` section and build a configuration from it.
///
/// `default_name` is used when the file has no `name` key, normally the
/// file stem.
pub fn build_strategy_config(
    config: &dyn ConfigPort,
    default_name: &str,
) -> Result<StrategyConfig, HunterError> {
    validate_strategy_config(config)?;
    let defaults = StrategyConfig::default();

    let text = |key: &str| {
        config
            .get_string(SECTION, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let time = |key: &str, default: NaiveTime| {
        text(key).and_then(|s| parse_time(&s)).unwrap_or(default)
    };

    let session_open = time("session_open", defaults.session_open);
    let session_close = time("session_close", defaults.session_close);
    let rules = match text("rules") {
        Some(raw) => parse_rules(&raw)?,
        None => defaults.rules.clone(),
    };

    Ok(StrategyConfig {
        name: text("name").unwrap_or_else(|| default_name.to_string()),
        description: text("description").unwrap_or_default(),
        symbol: text("symbol").unwrap_or_default().to_uppercase(),
        risk_budget: config.get_double(SECTION, "risk_budget", defaults.risk_budget),
        risk_per_attempt: config.get_double(SECTION, "risk_per_attempt", defaults.risk_per_attempt),
        fx_rate: config.get_double(SECTION, "fx_rate", defaults.fx_rate),
        min_gap_pct: config.get_double(SECTION, "min_gap_pct", defaults.min_gap_pct),
        min_rvol: config.get_double(SECTION, "min_rvol", defaults.min_rvol),
        orb_minutes: int_key(config, "orb_minutes", 15)?,
        require_news: config.get_bool(SECTION, "require_news", defaults.require_news),
        news_keywords: text("news_keywords")
            .map(|s| parse_list(&s))
            .unwrap_or_default(),
        scale_out_r1: config.get_double(SECTION, "scale_out_r1", defaults.scale_out_r1),
        scale_out_r2: config.get_double(SECTION, "scale_out_r2", defaults.scale_out_r2),
        atr_period: int_key(config, "atr_period", 14)?,
        atr_multiplier: config.get_double(SECTION, "atr_multiplier", defaults.atr_multiplier),
        eod_time_stop: config.get_bool(SECTION, "eod_time_stop", defaults.eod_time_stop),
        session_open,
        session_close,
        entry_start: time("entry_start", session_open),
        entry_end: time("entry_end", session_close),
        rules,
        news_timeout_ms: int_key(config, "news_timeout_ms", 250)?,
    })
}
