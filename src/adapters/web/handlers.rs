//! HTTP request handlers for the control plane.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::strategy_loader::{find_strategy, load_all};
use crate::adapters::tracing_sink::TracingEventSink;
use crate::domain::error::HunterError;
use crate::domain::hunt::{self, HuntReport, StrategyOutcome};
use crate::ports::broker_port::BrokerPort;

use super::{AppState, WebError};

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, serde::Serialize)]
pub struct StrategyEntry {
    pub name: String,
    pub symbol: Option<String>,
    pub file: String,
    pub valid: bool,
}

pub async fn list_strategies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StrategyEntry>>, WebError> {
    let entries = load_all(&state.strategies_dir)?
        .into_iter()
        .map(|(path, loaded)| {
            let file = path.display().to_string();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match loaded {
                Ok(config) => StrategyEntry {
                    name: config.name,
                    symbol: Some(config.symbol),
                    file,
                    valid: true,
                },
                Err(_) => StrategyEntry {
                    name: stem,
                    symbol: None,
                    file,
                    valid: false,
                },
            }
        })
        .collect();
    Ok(Json(entries))
}

#[derive(Debug, serde::Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub error: Option<String>,
}

pub async fn validate_strategy(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ValidationResponse>, WebError> {
    match find_strategy(&state.strategies_dir, &name) {
        Ok(_) => Ok(Json(ValidationResponse {
            valid: true,
            error: None,
        })),
        Err(e) if e.is_config() => Ok(Json(ValidationResponse {
            valid: false,
            error: Some(e.to_string()),
        })),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct HuntRequest {
    pub strategies: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct StrategyResult {
    pub name: String,
    pub symbol: String,
    pub outcome: &'static str,
    pub reason: Option<String>,
    pub bars_processed: usize,
    pub entries: usize,
    pub realized_pnl: f64,
    pub remaining_budget: f64,
    pub open_quantity: u64,
}

#[derive(Debug, serde::Serialize)]
pub struct HuntResponse {
    pub strategies: Vec<StrategyResult>,
}

impl From<HuntReport> for HuntResponse {
    fn from(report: HuntReport) -> Self {
        let strategies = report
            .strategies
            .into_iter()
            .map(|r| {
                let (outcome, reason) = match r.outcome {
                    StrategyOutcome::Completed => ("completed", None),
                    StrategyOutcome::Cancelled => ("cancelled", None),
                    StrategyOutcome::Failed(reason) => ("failed", Some(reason)),
                };
                StrategyResult {
                    name: r.summary.strategy,
                    symbol: r.summary.symbol,
                    outcome,
                    reason,
                    bars_processed: r.summary.bars_processed,
                    entries: r.summary.entries,
                    realized_pnl: r.summary.realized_pnl,
                    remaining_budget: r.summary.remaining_budget,
                    open_quantity: r.summary.open_quantity,
                }
            })
            .collect();
        HuntResponse { strategies }
    }
}

pub async fn start_hunt(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HuntRequest>,
) -> Result<Json<HuntResponse>, WebError> {
    if request.strategies.is_empty() {
        return Err(WebError::bad_request("no strategies requested"));
    }
    let configs = request
        .strategies
        .iter()
        .map(|name| find_strategy(&state.strategies_dir, name))
        .collect::<Result<Vec<_>, HunterError>>()?;

    info!(strategies = configs.len(), "hunt requested over HTTP");
    let report = hunt::start_hunt(
        configs,
        Arc::clone(&state.data),
        Arc::clone(&state.news),
        |_| Arc::new(PaperBroker::new()) as Arc<dyn BrokerPort>,
        Arc::new(TracingEventSink),
        state.shutdown.child_token(),
    )
    .await;
    Ok(Json(report.into()))
}

pub async fn not_found() -> WebError {
    WebError::not_found("not found")
}
