//! Strategy file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::HunterError;
use crate::domain::strategy::{StrategyConfig, build_strategy_config};

/// Read, validate and build one strategy file. The file stem is the default
/// strategy name.
pub fn load_strategy(path: &Path) -> Result<StrategyConfig, HunterError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "strategy".to_string());
    let config = build_strategy_config(&adapter, &stem)?;
    debug!(file = %path.display(), strategy = %config.name, symbol = %config.symbol, "strategy loaded");
    Ok(config)
}

/// All `*.ini` files directly inside `dir`, sorted by path.
pub fn discover_strategies(dir: &Path) -> Result<Vec<PathBuf>, HunterError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ini")))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Every strategy file in `dir` with its load result.
pub fn load_all(dir: &Path) -> Result<Vec<(PathBuf, Result<StrategyConfig, HunterError>)>, HunterError> {
    Ok(discover_strategies(dir)?
        .into_iter()
        .map(|path| {
            let loaded = load_strategy(&path);
            (path, loaded)
        })
        .collect())
}

/// Locate a strategy by name (or file stem) inside `dir`.
pub fn find_strategy(dir: &Path, name: &str) -> Result<StrategyConfig, HunterError> {
    let mut fallback = None;
    for path in discover_strategies(dir)? {
        let stem_matches = path.file_stem().is_some_and(|s| s.to_string_lossy() == name);
        match load_strategy(&path) {
            Ok(config) if config.name == name || stem_matches => return Ok(config),
            Err(e) if stem_matches => fallback = Some(e),
            _ => {}
        }
    }
    Err(fallback.unwrap_or_else(|| HunterError::StrategyNotFound {
        name: name.to_string(),
    }))
}
