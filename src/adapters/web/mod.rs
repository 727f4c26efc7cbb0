//! HTTP control plane.
//!
//! JSON endpoints for listing and validating strategy files and for running
//! replay hunts over them.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ports::market_data_port::MarketDataPort;
use crate::ports::news_port::NewsPort;

pub struct AppState {
    pub strategies_dir: PathBuf,
    pub data: Arc<dyn MarketDataPort>,
    pub news: Arc<dyn NewsPort>,
    /// Parent token; every hunt runs on a child of it.
    pub shutdown: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/strategies", get(handlers::list_strategies))
        .route("/strategies/{name}/validate", post(handlers::validate_strategy))
        .route("/hunts", post(handlers::start_hunt))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
