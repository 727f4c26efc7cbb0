use clap::Parser;
use tracing_subscriber::EnvFilter;
use tradehunter::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tradehunter=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}
