//! Market data port trait.

use futures::stream::BoxStream;

use crate::domain::bar::Bar;
use crate::domain::error::HunterError;

/// Pull-based bar stream. End of stream is a normal end of session data;
/// an `Err` item is a feed fault.
pub type BarStream = BoxStream<'static, Result<Bar, HunterError>>;

pub trait MarketDataPort: Send + Sync {
    /// Subscribe to bars for `symbol`, in non-decreasing timestamp order.
    fn bars(&self, symbol: &str) -> Result<BarStream, HunterError>;
}
