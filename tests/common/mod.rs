#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tradehunter::domain::bar::{Bar, NewsItem};
use tradehunter::domain::error::HunterError;
use tradehunter::domain::position::Transition;
use tradehunter::domain::rule::RuleCheck;
use tradehunter::domain::strategy::StrategyConfig;
use tradehunter::ports::broker_port::BrokerPort;
use tradehunter::ports::event_sink_port::EventSink;
use tradehunter::ports::market_data_port::{BarStream, MarketDataPort};
use tradehunter::ports::news_port::NewsPort;

pub fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn make_bar(day: u32, h: u32, m: u32, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: ts(day, h, m),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Prior day high 2.00, gap open at 2.07, opening range 08:00-08:15 with
/// high 2.10 and low 2.06, breakout bar at 08:16 with `breakout_volume`.
pub fn gap_day(breakout_volume: f64) -> Vec<Bar> {
    vec![
        make_bar(4, 8, 0, 1.90, 1.95, 1.88, 1.94, 1000.0),
        make_bar(4, 16, 0, 1.94, 2.00, 1.93, 1.98, 1000.0),
        make_bar(5, 8, 0, 2.07, 2.10, 2.06, 2.09, 1000.0),
        make_bar(5, 8, 5, 2.09, 2.10, 2.07, 2.08, 1000.0),
        make_bar(5, 8, 10, 2.08, 2.09, 2.06, 2.08, 1000.0),
        make_bar(5, 8, 15, 2.08, 2.09, 2.07, 2.08, 1000.0),
        make_bar(5, 8, 16, 2.08, 2.15, 2.08, 2.14, breakout_volume),
    ]
}

pub fn headline(text: &str) -> NewsItem {
    NewsItem {
        timestamp: ts(5, 7, 0),
        headline: text.to_string(),
        source: "RNS".to_string(),
    }
}

pub fn gapper_config(symbol: &str) -> StrategyConfig {
    StrategyConfig {
        name: format!("{}-gapper", symbol.to_lowercase()),
        symbol: symbol.to_string(),
        require_news: true,
        news_keywords: vec!["approval".to_string(), "contract".to_string()],
        ..StrategyConfig::default()
    }
}

enum Feed {
    Bars(Vec<Bar>),
    FaultAfter(Vec<Bar>, String),
    Endless(Vec<Bar>),
    Refused(String),
}

#[derive(Default)]
pub struct MockDataPort {
    feeds: HashMap<String, Feed>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.feeds.insert(symbol.to_string(), Feed::Bars(bars));
        self
    }

    /// Yields `bars` then a feed error item.
    pub fn with_fault_after(mut self, symbol: &str, bars: Vec<Bar>, reason: &str) -> Self {
        self.feeds
            .insert(symbol.to_string(), Feed::FaultAfter(bars, reason.to_string()));
        self
    }

    /// Yields `bars` then never ends.
    pub fn with_endless(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.feeds.insert(symbol.to_string(), Feed::Endless(bars));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.feeds
            .insert(symbol.to_string(), Feed::Refused(reason.to_string()));
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn bars(&self, symbol: &str) -> Result<BarStream, HunterError> {
        match self.feeds.get(symbol) {
            None => Err(HunterError::feed(symbol, "unknown symbol")),
            Some(Feed::Refused(reason)) => Err(HunterError::feed(symbol, reason.clone())),
            Some(Feed::Bars(bars)) => {
                Ok(futures::stream::iter(bars.clone().into_iter().map(Ok)).boxed())
            }
            Some(Feed::FaultAfter(bars, reason)) => {
                let fault = HunterError::feed(symbol, reason.clone());
                Ok(futures::stream::iter(bars.clone().into_iter().map(Ok))
                    .chain(futures::stream::once(async move { Err(fault) }))
                    .boxed())
            }
            Some(Feed::Endless(bars)) => Ok(futures::stream::iter(bars.clone().into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed()),
        }
    }
}

#[derive(Default)]
pub struct StaticNews {
    items: HashMap<String, NewsItem>,
    delay: Option<Duration>,
}

impl StaticNews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, symbol: &str, item: NewsItem) -> Self {
        self.items.insert(symbol.to_string(), item);
        self
    }

    /// Every lookup sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl NewsPort for StaticNews {
    async fn latest(&self, symbol: &str, at: NaiveDateTime) -> Result<Option<NewsItem>, HunterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .items
            .get(symbol)
            .filter(|item| item.timestamp <= at)
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    Entry { symbol: String, quantity: u64, price: f64, stop: f64 },
    Partial { symbol: String, quantity: u64, price: f64 },
    Exit { symbol: String, quantity: u64, price: f64 },
    Alert { symbol: String, message: String },
}

#[derive(Default)]
pub struct RecordingBroker {
    calls: Mutex<Vec<BrokerCall>>,
    fail_orders: bool,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order calls are recorded but return an error.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_orders: true,
        }
    }

    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<BrokerCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, BrokerCall::Alert { .. }))
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BrokerCall::Alert { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, symbol: &str, call: BrokerCall) -> Result<(), HunterError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_orders {
            return Err(HunterError::Broker {
                symbol: symbol.to_string(),
                reason: "rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerPort for RecordingBroker {
    async fn place_entry(&self, symbol: &str, quantity: u64, price: f64, stop: f64, _note: &str) -> Result<(), HunterError> {
        self.record(
            symbol,
            BrokerCall::Entry { symbol: symbol.to_string(), quantity, price, stop },
        )
    }

    async fn sell_partial(&self, symbol: &str, quantity: u64, price: f64, _note: &str) -> Result<(), HunterError> {
        self.record(
            symbol,
            BrokerCall::Partial { symbol: symbol.to_string(), quantity, price },
        )
    }

    async fn exit_all(&self, symbol: &str, quantity: u64, price: f64, _note: &str) -> Result<(), HunterError> {
        self.record(
            symbol,
            BrokerCall::Exit { symbol: symbol.to_string(), quantity, price },
        )
    }

    async fn alert(&self, symbol: &str, message: &str) -> Result<(), HunterError> {
        self.calls.lock().unwrap().push(BrokerCall::Alert {
            symbol: symbol.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    trails: Mutex<Vec<(String, NaiveDateTime, Vec<RuleCheck>)>>,
    transitions: Mutex<Vec<Transition>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trails(&self) -> Vec<(String, NaiveDateTime, Vec<RuleCheck>)> {
        self.trails.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.transitions.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn rule_checks(&self, symbol: &str, timestamp: NaiveDateTime, checks: &[RuleCheck]) {
        self.trails
            .lock()
            .unwrap()
            .push((symbol.to_string(), timestamp, checks.to_vec()));
    }

    fn transition(&self, transition: &Transition) {
        self.transitions.lock().unwrap().push(transition.clone());
    }
}

pub fn write_file(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub const GAPPER_INI: &str = "[strategy]
name = ABC Gapper
symbol = ABC
risk_budget = 1000
risk_per_attempt = 100
require_news = true
news_keywords = approval, contract
";

pub const GAP_DAY_CSV: &str = "timestamp,open,high,low,close,volume
2024-03-04 08:00,1.90,1.95,1.88,1.94,1000
2024-03-04 16:00,1.94,2.00,1.93,1.98,1000
2024-03-05 08:00,2.07,2.10,2.06,2.09,1000
2024-03-05 08:05,2.09,2.10,2.07,2.08,1000
2024-03-05 08:10,2.08,2.09,2.06,2.08,1000
2024-03-05 08:15,2.08,2.09,2.07,2.08,1000
2024-03-05 08:16,2.08,2.15,2.08,2.14,5000
2024-03-05 08:17,2.14,2.16,2.12,2.15,1200
";

pub const NEWS_CSV: &str = "timestamp,symbol,source,headline
2024-03-05 07:00,ABC,RNS,Company receives FDA approval
";
