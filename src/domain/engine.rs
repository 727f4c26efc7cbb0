//! Per-instrument strategy engine.
//!
//! One engine owns the indicator tracker, the rule set, at most one open
//! position and the remaining risk budget for a single strategy. Bars flow
//! one way:
//!
//! bar → indicators → (flat, in window) rules → sizing → entry → exits on
//! later bars
//!
//! [`StrategyEngine::step`] is the synchronous core; [`StrategyEngine::run`]
//! drives it from a bar stream and forwards decisions to the broker and the
//! event sink.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::bar::{Bar, NewsItem};
use crate::domain::error::HunterError;
use crate::domain::indicator::{IndicatorSnapshot, IndicatorTracker};
use crate::domain::position::{ExitPolicy, Position, Transition, TransitionKind, initial_stop};
use crate::domain::rule::RuleContext;
use crate::domain::rule_eval::{Evaluation, RuleSet};
use crate::domain::sizing::{capped_risk, position_size};
use crate::domain::strategy::StrategyConfig;
use crate::ports::broker_port::BrokerPort;
use crate::ports::event_sink_port::EventSink;
use crate::ports::market_data_port::BarStream;
use crate::ports::news_port::NewsPort;

/// Everything one bar produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub indicators: IndicatorSnapshot,
    /// Present when the rule set was evaluated on this bar.
    pub evaluation: Option<Evaluation>,
    pub transitions: Vec<Transition>,
    /// Set on the entry that spent the last of the risk budget.
    pub budget_exhausted: bool,
}

/// How a run loop ended when no feed fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Completed,
    Cancelled,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSummary {
    pub strategy: String,
    pub symbol: String,
    pub bars_processed: usize,
    pub entries: usize,
    pub realized_pnl: f64,
    pub remaining_budget: f64,
    pub open_quantity: u64,
}

#[derive(Debug)]
pub struct StrategyEngine {
    config: StrategyConfig,
    policy: ExitPolicy,
    tracker: IndicatorTracker,
    rules: RuleSet,
    position: Option<Position>,
    remaining_budget: f64,
    bars_processed: usize,
    entries: usize,
    closed_pnl: f64,
}

impl StrategyEngine {
    pub fn new(config: StrategyConfig) -> Self {
        let rules = RuleSet::from_config(&config);
        Self::with_rules(config, rules)
    }

    pub fn with_rules(config: StrategyConfig, rules: RuleSet) -> Self {
        StrategyEngine {
            policy: ExitPolicy::from(&config),
            tracker: IndicatorTracker::new(
                config.session_open,
                config.orb_minutes,
                config.atr_period,
            ),
            rules,
            position: None,
            remaining_budget: config.risk_budget,
            bars_processed: 0,
            entries: 0,
            closed_pnl: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn remaining_budget(&self) -> f64 {
        self.remaining_budget
    }

    pub fn tracker(&self) -> &IndicatorTracker {
        &self.tracker
    }

    pub fn summary(&self) -> EngineSummary {
        let open_pnl = self.position.as_ref().map_or(0.0, |p| p.realized_pnl);
        EngineSummary {
            strategy: self.config.name.clone(),
            symbol: self.config.symbol.clone(),
            bars_processed: self.bars_processed,
            entries: self.entries,
            realized_pnl: self.closed_pnl + open_pnl,
            remaining_budget: self.remaining_budget,
            open_quantity: self.position.as_ref().map_or(0, |p| p.quantity),
        }
    }

    /// Whether `bar` would reach rule evaluation. Used to skip the news
    /// lookup when nothing would read it.
    ///
    /// With the time stop enabled, bars at or after the time stop never open
    /// a position.
    pub fn wants_evaluation(&self, bar: &Bar) -> bool {
        let time = bar.time();
        let past_time_stop = self.policy.eod_time_stop && time >= self.policy.time_stop_at;
        self.is_flat()
            && self.remaining_budget > 0.0
            && self.config.in_entry_window(time)
            && !past_time_stop
    }

    /// Process one bar to completion.
    pub fn step(&mut self, bar: &Bar, news: Option<&NewsItem>) -> StepOutcome {
        let evaluate = self.wants_evaluation(bar);
        let (indicators, new_session) = self.tracker.update(bar);
        self.bars_processed += 1;
        if new_session {
            debug!(symbol = %self.config.symbol, date = %bar.date(), "new session");
        }

        let mut outcome = StepOutcome {
            indicators,
            evaluation: None,
            transitions: Vec::new(),
            budget_exhausted: false,
        };

        if let Some(position) = self.position.as_mut() {
            outcome.transitions = position.on_bar(bar, indicators.vwap, &self.policy);
            if outcome.transitions.last().is_some_and(|t| t.kind.is_exit()) {
                self.closed_pnl += position.realized_pnl;
                self.position = None;
            }
            return outcome;
        }

        if !evaluate {
            return outcome;
        }

        let ctx = RuleContext {
            bar,
            today: self.tracker.today(),
            previous_day: self.tracker.previous_day(),
            news,
            indicators,
            opening_range: self.tracker.opening_range(),
        };
        let evaluation = self.rules.evaluate(&ctx);
        if evaluation.passed {
            let stop = initial_stop(
                bar.close,
                indicators.atr,
                self.config.atr_multiplier,
                self.tracker.opening_range(),
                bar.low,
            );
            if let Some(entry) = self.enter(bar, stop) {
                outcome.budget_exhausted = self.remaining_budget <= 0.0;
                outcome.transitions.push(entry);
            }
        }
        outcome.evaluation = Some(evaluation);
        outcome
    }

    fn enter(&mut self, bar: &Bar, stop: f64) -> Option<Transition> {
        let risk_per_share = bar.close - stop;
        let quantity = position_size(
            self.config.risk_per_attempt,
            self.remaining_budget,
            self.config.fx_rate,
            risk_per_share,
        );
        if quantity == 0 {
            debug!(
                symbol = %self.config.symbol,
                risk_per_share,
                remaining_budget = self.remaining_budget,
                "signal passed but size is zero; no entry"
            );
            return None;
        }

        let risk = capped_risk(self.config.risk_per_attempt, self.remaining_budget);
        self.remaining_budget -= risk;
        self.entries += 1;
        self.position = Some(Position::open(
            &self.config.symbol,
            bar.timestamp,
            bar.close,
            stop,
            quantity,
        ));

        Some(Transition {
            kind: TransitionKind::Entry,
            symbol: self.config.symbol.clone(),
            timestamp: bar.timestamp,
            quantity,
            price: bar.close,
            note: format!(
                "stop {:.4}, risk/share {:.4}, risk {:.2} of budget",
                stop, risk_per_share, risk
            ),
        })
    }

    /// Drive the engine from `bars` until the stream ends, a feed fault
    /// occurs or `cancel` fires.
    ///
    /// Cancellation is checked while waiting for each bar; a bar already
    /// taken from the stream is processed to completion.
    pub async fn run(
        &mut self,
        mut bars: BarStream,
        news: &dyn NewsPort,
        broker: &dyn BrokerPort,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<RunEnd, HunterError> {
        info!(
            strategy = %self.config.name,
            symbol = %self.config.symbol,
            budget = self.remaining_budget,
            "engine started"
        );
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(symbol = %self.config.symbol, "engine cancelled");
                    return Ok(RunEnd::Cancelled);
                }
                item = bars.next() => item,
            };
            let bar = match next {
                None => break,
                Some(Ok(bar)) => bar,
                Some(Err(e)) => {
                    warn!(symbol = %self.config.symbol, error = %e, "feed fault");
                    return Err(e);
                }
            };

            let item = if self.wants_evaluation(&bar) {
                self.lookup_news(news, &bar).await
            } else {
                None
            };
            let outcome = self.step(&bar, item.as_ref());

            if let Some(evaluation) = &outcome.evaluation {
                sink.rule_checks(&self.config.symbol, bar.timestamp, &evaluation.checks);
            }
            for transition in &outcome.transitions {
                sink.transition(transition);
                self.dispatch(broker, transition).await;
            }
            if outcome.budget_exhausted {
                info!(symbol = %self.config.symbol, "risk budget exhausted");
                let message = format!("{}: risk budget exhausted", self.config.name);
                if let Err(e) = broker.alert(&self.config.symbol, &message).await {
                    warn!(symbol = %self.config.symbol, error = %e, "alert failed");
                }
            }
        }
        info!(symbol = %self.config.symbol, bars = self.bars_processed, "feed finished");
        Ok(RunEnd::Completed)
    }

    async fn lookup_news(&self, news: &dyn NewsPort, bar: &Bar) -> Option<NewsItem> {
        let symbol = &self.config.symbol;
        let limit = Duration::from_millis(self.config.news_timeout_ms);
        match tokio::time::timeout(limit, news.latest(symbol, bar.timestamp)).await {
            Ok(Ok(item)) => item,
            Ok(Err(e)) => {
                warn!(symbol = %symbol, error = %e, "news lookup failed");
                None
            }
            Err(_) => {
                debug!(symbol = %symbol, timeout_ms = self.config.news_timeout_ms, "news lookup timed out");
                None
            }
        }
    }

    async fn dispatch(&self, broker: &dyn BrokerPort, t: &Transition) {
        let result = match t.kind {
            TransitionKind::Entry => {
                let stop = self.position.as_ref().map_or(t.price, |p| p.stop_price);
                let placed = broker
                    .place_entry(&t.symbol, t.quantity, t.price, stop, &t.note)
                    .await;
                let message = format!(
                    "{}: entry signal, buy {} @ {:.4} stop {:.4}",
                    self.config.name, t.quantity, t.price, stop
                );
                if let Err(e) = broker.alert(&t.symbol, &message).await {
                    warn!(symbol = %t.symbol, error = %e, "alert failed");
                }
                placed
            }
            TransitionKind::ScaleOut1 | TransitionKind::ScaleOut2 => {
                broker
                    .sell_partial(&t.symbol, t.quantity, t.price, &t.note)
                    .await
            }
            TransitionKind::HardStop | TransitionKind::TimeStop => {
                broker.exit_all(&t.symbol, t.quantity, t.price, &t.note).await
            }
            TransitionKind::TrailStop => Ok(()),
        };
        if let Err(e) = result {
            warn!(symbol = %t.symbol, kind = %t.kind, error = %e, "broker call failed");
        }
    }
}
