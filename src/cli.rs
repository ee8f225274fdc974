//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_quote_adapter::CsvQuoteAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_quote_adapter::HttpQuoteAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::web::{build_router, AppState};
use crate::domain::error::PapertradeError;
use crate::domain::money::usd;
use crate::domain::projection::Projector;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuoteOracle;

#[derive(Parser, Debug)]
#[command(name = "papertrade", about = "Web-based stock trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create a user account (password read from stdin)
    AddUser {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        username: String,
        /// Starting cash; defaults to [trading] starting_cash
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Look up the current quote for a symbol
    Quote {
        #[arg(short, long)]
        config: PathBuf,
        symbol: String,
    },
    /// Project a price 365 days ahead from historical closes
    Predict {
        #[arg(short, long)]
        config: PathBuf,
        symbol: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::AddUser {
            config,
            username,
            cash,
        } => run_add_user(&config, &username, cash),
        Command::Quote { config, symbol } => run_quote(&config, &symbol),
        Command::Predict { config, symbol } => run_predict(&config, &symbol),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PapertradeError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Build the configured quote provider: `[oracle] provider = http | csv`.
pub fn build_oracle(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn QuoteOracle + Send + Sync>, PapertradeError> {
    let provider = config
        .get_string("oracle", "provider")
        .unwrap_or_else(|| "http".to_string());

    match provider.as_str() {
        "http" => Ok(Arc::new(HttpQuoteAdapter::from_config(config)?)),
        "csv" => {
            let path =
                config
                    .get_string("oracle", "path")
                    .ok_or_else(|| PapertradeError::ConfigMissing {
                        section: "oracle".into(),
                        key: "path".into(),
                    })?;
            Ok(Arc::new(CsvQuoteAdapter::new(PathBuf::from(path))))
        }
        other => Err(PapertradeError::ConfigInvalid {
            section: "oracle".into(),
            key: "provider".into(),
            reason: format!("unknown provider '{other}' (expected http or csv)"),
        }),
    }
}

fn open_store(config: &dyn ConfigPort) -> Result<Arc<SqliteAdapter>, PapertradeError> {
    Ok(Arc::new(SqliteAdapter::from_config(config)?))
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = store.initialize_schema() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let oracle = match build_oracle(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let listen = config
        .get_string("web", "listen")
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let addr: std::net::SocketAddr = match listen.parse() {
        Ok(a) => a,
        Err(_) => {
            let err = PapertradeError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: format!("not a socket address: {listen}"),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let state = AppState::new(store, oracle, Arc::new(config));
    let router = match build_router(state) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Starting web server on {addr}");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let served = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    });

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = open_store(&config).and_then(|store| store.initialize_schema());
    match result {
        Ok(()) => {
            eprintln!("Database schema initialized");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_add_user(config_path: &PathBuf, username: &str, cash: Option<f64>) -> ExitCode {
    use std::io::BufRead;

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let starting_cash =
        cash.unwrap_or_else(|| config.get_double("trading", "starting_cash", 10_000.0));
    if starting_cash < 0.0 {
        eprintln!("error: starting cash cannot be negative");
        return ExitCode::from(4);
    }

    eprintln!("Enter password for {username}:");
    let stdin = std::io::stdin();
    let password = match stdin.lock().lines().next() {
        Some(Ok(line)) if !line.is_empty() => line,
        _ => {
            eprintln!("error: a non-empty password is required");
            return ExitCode::from(4);
        }
    };

    let result = open_store(&config).and_then(|store| {
        let hash = crate::adapters::web::hash_password(&password)?;
        store.initialize_schema()?;
        use crate::ports::store_port::StorePort;
        store.create_user(username, &hash, starting_cash)
    });

    match result {
        Ok(id) => {
            eprintln!("Created user {username} (id {id}) with {}", usd(starting_cash));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_quote(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = build_oracle(&config).and_then(|oracle| oracle.lookup(symbol));
    match result {
        Ok(Some(quote)) => {
            println!("{} ({}): {}", quote.name, quote.symbol, usd(quote.price));
            ExitCode::SUCCESS
        }
        Ok(None) => {
            let err = PapertradeError::SymbolNotFound {
                symbol: symbol.to_string(),
            };
            eprintln!("error: {err}");
            (&err).into()
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_predict(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result =
        build_oracle(&config).and_then(|oracle| Projector::new(oracle).project(symbol));
    match result {
        Ok(projection) => {
            println!("symbol:          {}", projection.symbol);
            println!("current price:   {}", usd(projection.current_price));
            println!("projected (1y):  {}", usd(projection.projected_price));
            println!("fit quality:     {:.2}%", projection.fit_quality_pct);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
