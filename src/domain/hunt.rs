//! Strategy orchestration.
//!
//! One tokio task per strategy, all sharing a single cancellation token and
//! joined through a `JoinSet`. Tasks share no mutable state; a failure in one
//! strategy is recorded in its outcome and never stops its siblings.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::engine::{EngineSummary, RunEnd, StrategyEngine};
use crate::domain::strategy::StrategyConfig;
use crate::ports::broker_port::BrokerPort;
use crate::ports::event_sink_port::EventSink;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::news_port::NewsPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyOutcome::Completed => write!(f, "completed"),
            StrategyOutcome::Cancelled => write!(f, "cancelled"),
            StrategyOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub outcome: StrategyOutcome,
    pub summary: EngineSummary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HuntReport {
    /// One entry per strategy, in the order the strategies were given.
    pub strategies: Vec<StrategyReport>,
}

impl HuntReport {
    pub fn get(&self, name: &str) -> Option<&StrategyReport> {
        self.strategies.iter().find(|r| r.summary.strategy == name)
    }

    pub fn failed(&self) -> impl Iterator<Item = &StrategyReport> {
        self.strategies
            .iter()
            .filter(|r| matches!(r.outcome, StrategyOutcome::Failed(_)))
    }

    pub fn all_completed(&self) -> bool {
        self.strategies
            .iter()
            .all(|r| r.outcome == StrategyOutcome::Completed)
    }
}

/// Collaborators for one strategy run.
pub struct StrategyWiring {
    pub config: StrategyConfig,
    pub data: Arc<dyn MarketDataPort>,
    pub news: Arc<dyn NewsPort>,
    pub broker: Arc<dyn BrokerPort>,
    pub sink: Arc<dyn EventSink>,
}

async fn run_one(wiring: StrategyWiring, cancel: CancellationToken) -> StrategyReport {
    let StrategyWiring {
        config,
        data,
        news,
        broker,
        sink,
    } = wiring;
    let mut engine = StrategyEngine::new(config);

    let outcome = match data.bars(engine.symbol()) {
        Err(e) => StrategyOutcome::Failed(e.to_string()),
        Ok(bars) => {
            match engine
                .run(bars, news.as_ref(), broker.as_ref(), sink.as_ref(), &cancel)
                .await
            {
                Ok(RunEnd::Completed) => StrategyOutcome::Completed,
                Ok(RunEnd::Cancelled) => StrategyOutcome::Cancelled,
                Err(e) => StrategyOutcome::Failed(e.to_string()),
            }
        }
    };

    let summary = engine.summary();
    match &outcome {
        StrategyOutcome::Failed(reason) => {
            error!(strategy = %summary.strategy, symbol = %summary.symbol, reason = %reason, "strategy failed");
        }
        other => {
            info!(
                strategy = %summary.strategy,
                symbol = %summary.symbol,
                outcome = %other,
                bars = summary.bars_processed,
                entries = summary.entries,
                pnl = summary.realized_pnl,
                "strategy finished"
            );
        }
    }
    StrategyReport { outcome, summary }
}

fn empty_summary(config: &StrategyConfig) -> EngineSummary {
    EngineSummary {
        strategy: config.name.clone(),
        symbol: config.symbol.clone(),
        bars_processed: 0,
        entries: 0,
        realized_pnl: 0.0,
        remaining_budget: config.risk_budget,
        open_quantity: 0,
    }
}

/// Run every wired strategy concurrently until each completes, fails or is
/// cancelled.
pub async fn run_strategies(wirings: Vec<StrategyWiring>, cancel: CancellationToken) -> HuntReport {
    info!(strategies = wirings.len(), "hunt started");

    let placeholders: Vec<StrategyReport> = wirings
        .iter()
        .map(|w| StrategyReport {
            outcome: StrategyOutcome::Failed("task aborted".to_string()),
            summary: empty_summary(&w.config),
        })
        .collect();
    let mut slots: Vec<Option<StrategyReport>> = vec![None; wirings.len()];

    let mut tasks = JoinSet::new();
    for (index, wiring) in wirings.into_iter().enumerate() {
        let token = cancel.clone();
        tasks.spawn(async move { (index, run_one(wiring, token).await) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => slots[index] = Some(report),
            Err(e) => warn!(error = %e, "strategy task did not finish"),
        }
    }

    let strategies = slots
        .into_iter()
        .zip(placeholders)
        .map(|(slot, placeholder)| slot.unwrap_or(placeholder))
        .collect();
    let report = HuntReport { strategies };
    info!(failed = report.failed().count(), "hunt finished");
    report
}

/// Wire each strategy to the shared data and news sources and its own
/// broker, then run them all.
pub async fn start_hunt<F>(
    strategies: Vec<StrategyConfig>,
    data: Arc<dyn MarketDataPort>,
    news: Arc<dyn NewsPort>,
    broker_factory: F,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) -> HuntReport
where
    F: Fn(&StrategyConfig) -> Arc<dyn BrokerPort>,
{
    let wirings = strategies
        .into_iter()
        .map(|config| StrategyWiring {
            broker: broker_factory(&config),
            data: Arc::clone(&data),
            news: Arc::clone(&news),
            sink: Arc::clone(&sink),
            config,
        })
        .collect();
    run_strategies(wirings, cancel).await
}
