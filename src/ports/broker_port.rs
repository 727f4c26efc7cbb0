//! Brokerage port trait.
//!
//! Errors returned here are logged by the engine and never change its
//! trading state.

use async_trait::async_trait;

use crate::domain::error::HunterError;

#[async_trait]
pub trait BrokerPort: Send + Sync {
    async fn place_entry(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        stop: f64,
        note: &str,
    ) -> Result<(), HunterError>;

    async fn sell_partial(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        note: &str,
    ) -> Result<(), HunterError>;

    async fn exit_all(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        note: &str,
    ) -> Result<(), HunterError>;

    async fn alert(&self, symbol: &str, message: &str) -> Result<(), HunterError>;
}
