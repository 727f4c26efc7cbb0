//! CSV replay adapters for bars and news.

use crate::domain::bar::{Bar, NewsItem};
use crate::domain::error::HunterError;
use crate::ports::market_data_port::{BarStream, MarketDataPort};
use crate::ports::news_port::NewsPort;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Replays `<dir>/<SYMBOL>.csv` with columns
/// `timestamp,open,high,low,close,volume`.
pub struct CsvBarFeed {
    base_path: PathBuf,
}

impl CsvBarFeed {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<&'r str, HunterError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| HunterError::feed(symbol, format!("missing {} column", name)))
}

fn number(record: &csv::StringRecord, index: usize, name: &str, symbol: &str) -> Result<f64, HunterError> {
    let raw = field(record, index, name, symbol)?;
    raw.parse::<f64>()
        .map_err(|e| HunterError::feed(symbol, format!("invalid {} value '{}': {}", name, raw, e)))
}

fn parse_bar(record: &csv::StringRecord, symbol: &str) -> Result<Bar, HunterError> {
    let raw = field(record, 0, "timestamp", symbol)?;
    let timestamp = parse_timestamp(raw)
        .ok_or_else(|| HunterError::feed(symbol, format!("invalid timestamp '{}'", raw)))?;
    Ok(Bar {
        timestamp,
        open: number(record, 1, "open", symbol)?,
        high: number(record, 2, "high", symbol)?,
        low: number(record, 3, "low", symbol)?,
        close: number(record, 4, "close", symbol)?,
        volume: number(record, 5, "volume", symbol)?,
    })
}

impl MarketDataPort for CsvBarFeed {
    fn bars(&self, symbol: &str) -> Result<BarStream, HunterError> {
        let path = self.csv_path(symbol);
        let content = fs::read(&path).map_err(|e| {
            HunterError::feed(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let symbol = symbol.to_string();
        let mut last: Option<NaiveDateTime> = None;
        let rows = csv::Reader::from_reader(Cursor::new(content))
            .into_records()
            .enumerate()
            .map(move |(row, result)| {
                let record = result.map_err(|e| {
                    HunterError::feed(&symbol, format!("CSV parse error at row {}: {}", row + 1, e))
                })?;
                let bar = parse_bar(&record, &symbol)?;
                if last.is_some_and(|prev| bar.timestamp < prev) {
                    return Err(HunterError::feed(
                        &symbol,
                        format!("bar at {} is out of order", bar.timestamp),
                    ));
                }
                last = Some(bar.timestamp);
                Ok(bar)
            });
        Ok(futures::stream::iter(rows).boxed())
    }
}

/// News replay from `<dir>/news.csv` with columns
/// `timestamp,symbol,source,headline`. A missing file means no news.
#[derive(Debug, Default)]
pub struct CsvNewsFeed {
    items: HashMap<String, Vec<NewsItem>>,
}

impl CsvNewsFeed {
    pub fn load(dir: &Path) -> Result<Self, HunterError> {
        let path = dir.join("news.csv");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut items: HashMap<String, Vec<NewsItem>> = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| HunterError::News {
                symbol: "*".into(),
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let symbol = record.get(1).unwrap_or_default().trim().to_uppercase();
            let raw = record.get(0).unwrap_or_default();
            let timestamp = parse_timestamp(raw).ok_or_else(|| HunterError::News {
                symbol: symbol.clone(),
                reason: format!("invalid timestamp '{}'", raw),
            })?;
            items.entry(symbol).or_default().push(NewsItem {
                timestamp,
                source: record.get(2).unwrap_or_default().trim().to_string(),
                headline: record.get(3).unwrap_or_default().trim().to_string(),
            });
        }
        for list in items.values_mut() {
            list.sort_by_key(|n| n.timestamp);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest_at(&self, symbol: &str, at: NaiveDateTime) -> Option<&NewsItem> {
        let list = self.items.get(&symbol.to_uppercase())?;
        let idx = list.partition_point(|n| n.timestamp <= at);
        idx.checked_sub(1).map(|i| &list[i])
    }
}

#[async_trait]
impl NewsPort for CsvNewsFeed {
    async fn latest(
        &self,
        symbol: &str,
        at: NaiveDateTime,
    ) -> Result<Option<NewsItem>, HunterError> {
        Ok(self.latest_at(symbol, at).cloned())
    }
}
