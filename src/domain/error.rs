//! Domain error types.

/// Top-level error type for papertrade.
#[derive(Debug, thiserror::Error)]
pub enum PapertradeError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no price history for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient funds: need ${required:.2}, have ${available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient shares of {symbol}: requested {requested}, holding {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("quote provider unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error("username already taken: {username}")]
    DuplicateUsername { username: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PapertradeError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PapertradeError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&PapertradeError> for std::process::ExitCode {
    fn from(err: &PapertradeError) -> Self {
        let code: u8 = match err {
            PapertradeError::Io(_) => 1,
            PapertradeError::ConfigParse { .. }
            | PapertradeError::ConfigMissing { .. }
            | PapertradeError::ConfigInvalid { .. } => 2,
            PapertradeError::Database { .. } | PapertradeError::DatabaseQuery { .. } => 3,
            PapertradeError::InvalidInput { .. } | PapertradeError::DuplicateUsername { .. } => 4,
            PapertradeError::SymbolNotFound { .. }
            | PapertradeError::NoData { .. }
            | PapertradeError::OracleUnavailable { .. } => 5,
            PapertradeError::InsufficientFunds { .. }
            | PapertradeError::InsufficientShares { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
