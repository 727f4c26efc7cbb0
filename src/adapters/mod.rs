//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod paper_broker;
pub mod strategy_loader;
pub mod tracing_sink;
#[cfg(feature = "web")]
pub mod web;
