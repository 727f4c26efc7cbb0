//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::adapters::csv_adapter::{CsvBarFeed, CsvNewsFeed};
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::strategy_loader::{discover_strategies, load_all, load_strategy};
use crate::adapters::tracing_sink::TracingEventSink;
use crate::domain::error::HunterError;
use crate::domain::hunt::{HuntReport, start_hunt};
use crate::domain::strategy::StrategyConfig;
use crate::ports::broker_port::BrokerPort;
use crate::ports::news_port::{NewsPort, NoNews};

#[derive(Parser, Debug)]
#[command(name = "tradehunter", about = "Intraday gap-and-go strategy engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run strategies against replayed market data
    Hunt {
        /// Strategy file; may be repeated
        #[arg(short, long)]
        strategy: Vec<PathBuf>,
        /// Directory of *.ini strategy files
        #[arg(long)]
        strategies_dir: Option<PathBuf>,
        /// Directory holding <SYMBOL>.csv bar files
        #[arg(short, long)]
        data: PathBuf,
        /// Directory holding news.csv
        #[arg(short, long)]
        news: Option<PathBuf>,
    },
    /// Validate a strategy file
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List strategies in a directory
    List {
        #[arg(long)]
        strategies_dir: PathBuf,
    },
    /// Start the HTTP control plane
    Serve {
        #[arg(long)]
        strategies_dir: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        news: Option<PathBuf>,
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Hunt {
            strategy,
            strategies_dir,
            data,
            news,
        } => run_hunt(&strategy, strategies_dir.as_deref(), &data, news.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::List { strategies_dir } => run_list(&strategies_dir),
        Command::Serve {
            strategies_dir,
            data,
            news,
            addr,
        } => run_serve(&strategies_dir, &data, news.as_deref(), &addr),
    }
}

fn fail(err: &HunterError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Strategy files named explicitly plus every file in `dir`, in that order.
pub fn resolve_strategies(
    files: &[PathBuf],
    dir: Option<&Path>,
) -> Result<Vec<StrategyConfig>, HunterError> {
    let mut paths = files.to_vec();
    if let Some(dir) = dir {
        paths.extend(discover_strategies(dir)?);
    }
    if paths.is_empty() {
        return Err(HunterError::StrategyNotFound {
            name: "no strategy files given".to_string(),
        });
    }
    paths.iter().map(|p| load_strategy(p)).collect()
}

pub fn load_news(dir: Option<&Path>) -> Result<Arc<dyn NewsPort>, HunterError> {
    match dir {
        Some(dir) => Ok(Arc::new(CsvNewsFeed::load(dir)?)),
        None => Ok(Arc::new(NoNews)),
    }
}

pub fn format_report(report: &HuntReport) -> Vec<String> {
    report
        .strategies
        .iter()
        .map(|r| {
            let s = &r.summary;
            format!(
                "{:<20} {:<8} {:<24} bars={:<6} entries={:<3} pnl={:>10.2} budget={:>10.2} open={}",
                s.strategy,
                s.symbol,
                r.outcome.to_string(),
                s.bars_processed,
                s.entries,
                s.realized_pnl,
                s.remaining_budget,
                s.open_quantity
            )
        })
        .collect()
}

fn runtime() -> Result<tokio::runtime::Runtime, HunterError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn run_hunt(
    files: &[PathBuf],
    strategies_dir: Option<&Path>,
    data_dir: &Path,
    news_dir: Option<&Path>,
) -> ExitCode {
    let strategies = match resolve_strategies(files, strategies_dir) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let news = match load_news(news_dir) {
        Ok(n) => n,
        Err(e) => return fail(&e),
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => return fail(&e),
    };

    eprintln!("Hunting with {} strategies", strategies.len());
    let data = Arc::new(CsvBarFeed::new(data_dir.to_path_buf()));
    let report = rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling hunt");
                on_signal.cancel();
            }
        });
        start_hunt(
            strategies,
            data,
            news,
            |_| Arc::new(PaperBroker::new()) as Arc<dyn BrokerPort>,
            Arc::new(TracingEventSink),
            cancel,
        )
        .await
    });

    for line in format_report(&report) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}

fn run_validate(path: &Path) -> ExitCode {
    eprintln!("Validating strategy: {}", path.display());
    let config = match load_strategy(path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let rules: Vec<String> = config.rules.iter().map(ToString::to_string).collect();
    println!("Strategy:       {}", config.name);
    if !config.description.is_empty() {
        println!("Description:    {}", config.description);
    }
    println!("Symbol:         {}", config.symbol);
    println!(
        "Risk:           {:.2} per attempt of {:.2} (fx {:.4})",
        config.risk_per_attempt, config.risk_budget, config.fx_rate
    );
    println!(
        "Session:        {} - {} (entries {} - {})",
        config.session_open.format("%H:%M"),
        config.session_close.format("%H:%M"),
        config.entry_start.format("%H:%M"),
        config.entry_end.format("%H:%M")
    );
    println!("Rules:          {}", rules.join(", "));
    println!(
        "Exits:          scale at {:.1}R / {:.1}R, stop {:.1} x ATR({}), time stop {}",
        config.scale_out_r1,
        config.scale_out_r2,
        config.atr_multiplier,
        config.atr_period,
        if config.eod_time_stop { "on" } else { "off" }
    );
    if config.require_news {
        println!("News keywords:  {}", config.news_keywords.join(", "));
    }
    println!("\nStrategy is valid.");
    ExitCode::SUCCESS
}

fn run_list(dir: &Path) -> ExitCode {
    let all = match load_all(dir) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    if all.is_empty() {
        eprintln!("No strategy files in {}", dir.display());
    }
    for (path, loaded) in all {
        match loaded {
            Ok(config) => println!("{:<24} {:<8} {}", config.name, config.symbol, path.display()),
            Err(e) => println!("{:<24} {:<8} {} ({})", "-", "INVALID", path.display(), e),
        }
    }
    ExitCode::SUCCESS
}

fn run_serve(strategies_dir: &Path, data_dir: &Path, news_dir: Option<&Path>, addr: &str) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;

        let addr: SocketAddr = match addr.parse() {
            Ok(a) => a,
            Err(e) => {
                return fail(&HunterError::invalid("serve", "addr", format!("{}: {}", addr, e)));
            }
        };
        let news = match load_news(news_dir) {
            Ok(n) => n,
            Err(e) => return fail(&e),
        };
        let rt = match runtime() {
            Ok(rt) => rt,
            Err(e) => return fail(&e),
        };

        let shutdown = CancellationToken::new();
        let state = AppState {
            strategies_dir: strategies_dir.to_path_buf(),
            data: Arc::new(CsvBarFeed::new(data_dir.to_path_buf())),
            news,
            shutdown: shutdown.clone(),
        };
        let router = build_router(state);

        let served: Result<(), HunterError> = rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "control plane listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = tokio::signal::ctrl_c().await;
                    shutdown.cancel();
                })
                .await?;
            Ok(())
        });
        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (strategies_dir, data_dir, news_dir, addr);
        eprintln!("error: web feature not enabled. Rebuild with --features web");
        ExitCode::from(1)
    }
}
