//! Paper brokerage: logs every call and records fills in memory.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::domain::error::HunterError;
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub symbol: String,
    pub side: FillSide,
    pub quantity: u64,
    pub price: f64,
    pub note: String,
}

#[derive(Debug, Default)]
pub struct PaperBroker {
    fills: Mutex<Vec<Fill>>,
    alerts: Mutex<Vec<String>>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every fill so far, in order.
    pub fn fills(&self) -> Vec<Fill> {
        self.fills.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Shares bought minus shares sold for `symbol`.
    pub fn net_quantity(&self, symbol: &str) -> i64 {
        self.fills()
            .iter()
            .filter(|f| f.symbol == symbol)
            .map(|f| match f.side {
                FillSide::Buy => f.quantity as i64,
                FillSide::Sell => -(f.quantity as i64),
            })
            .sum()
    }

    fn record(&self, fill: Fill) -> Result<(), HunterError> {
        let mut fills = self.fills.lock().map_err(|_| HunterError::Broker {
            symbol: fill.symbol.clone(),
            reason: "fill ledger poisoned".into(),
        })?;
        fills.push(fill);
        Ok(())
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn place_entry(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        stop: f64,
        note: &str,
    ) -> Result<(), HunterError> {
        info!(symbol = %symbol, quantity, price, stop, "paper BUY");
        self.record(Fill {
            symbol: symbol.to_string(),
            side: FillSide::Buy,
            quantity,
            price,
            note: note.to_string(),
        })
    }

    async fn sell_partial(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        note: &str,
    ) -> Result<(), HunterError> {
        info!(symbol = %symbol, quantity, price, note = %note, "paper SELL partial");
        self.record(Fill {
            symbol: symbol.to_string(),
            side: FillSide::Sell,
            quantity,
            price,
            note: note.to_string(),
        })
    }

    async fn exit_all(
        &self,
        symbol: &str,
        quantity: u64,
        price: f64,
        note: &str,
    ) -> Result<(), HunterError> {
        info!(symbol = %symbol, quantity, price, note = %note, "paper SELL all");
        self.record(Fill {
            symbol: symbol.to_string(),
            side: FillSide::Sell,
            quantity,
            price,
            note: note.to_string(),
        })
    }

    async fn alert(&self, symbol: &str, message: &str) -> Result<(), HunterError> {
        info!(symbol = %symbol, "ALERT: {}", message);
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
        Ok(())
    }
}
