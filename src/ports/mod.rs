//! Port traits the engine depends on.
//!
//! Market data, news, brokerage and event reporting are all reached through
//! these traits so the engine can be driven by replay files, mocks or live
//! connectors without change.

pub mod broker_port;
pub mod config_port;
pub mod event_sink_port;
pub mod market_data_port;
pub mod news_port;
