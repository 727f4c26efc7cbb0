//! Domain error types.

/// Top-level error type for tradehunter.
#[derive(Debug, thiserror::Error)]
pub enum HunterError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data feed error for {symbol}: {reason}")]
    Feed { symbol: String, reason: String },

    #[error("news feed error for {symbol}: {reason}")]
    News { symbol: String, reason: String },

    #[error("broker error for {symbol}: {reason}")]
    Broker { symbol: String, reason: String },

    #[error("strategy not found: {name}")]
    StrategyNotFound { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HunterError {
    pub fn feed(symbol: &str, reason: impl Into<String>) -> Self {
        HunterError::Feed {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        HunterError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        HunterError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HunterError::ConfigParse { .. }
                | HunterError::ConfigMissing { .. }
                | HunterError::ConfigInvalid { .. }
        )
    }
}

impl From<&HunterError> for std::process::ExitCode {
    fn from(err: &HunterError) -> Self {
        let code: u8 = match err {
            HunterError::Io(_) => 1,
            HunterError::ConfigParse { .. }
            | HunterError::ConfigMissing { .. }
            | HunterError::ConfigInvalid { .. } => 2,
            HunterError::Feed { .. } | HunterError::News { .. } => 3,
            HunterError::Broker { .. } => 4,
            HunterError::StrategyNotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
