//! News lookup port trait.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::bar::NewsItem;
use crate::domain::error::HunterError;

#[async_trait]
pub trait NewsPort: Send + Sync {
    /// Most recent item for `symbol` published at or before `at`.
    async fn latest(&self, symbol: &str, at: NaiveDateTime)
    -> Result<Option<NewsItem>, HunterError>;
}

/// News source that never has anything to say.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNews;

#[async_trait]
impl NewsPort for NoNews {
    async fn latest(
        &self,
        _symbol: &str,
        _at: NaiveDateTime,
    ) -> Result<Option<NewsItem>, HunterError> {
        Ok(None)
    }
}
