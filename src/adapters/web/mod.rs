//! Web server adapter.
//!
//! Axum router with askama-rendered pages: portfolio, buy/sell, quote,
//! history, predict, plus registration and session-based login.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{hash_password, Backend, Credentials, WebUser};
pub use error::WebError;
pub use templates::*;

use axum::{
    routing::{get, post},
    Router,
};
use axum_login::{login_required, AuthManagerLayerBuilder};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_sessions::cookie::Key;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::domain::error::PapertradeError;
use crate::domain::ledger::Ledger;
use crate::domain::projection::Projector;
use crate::domain::settlement::SettlementEngine;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuoteOracle;
use crate::ports::store_port::StorePort;

pub struct AppState {
    pub store: Arc<dyn StorePort + Send + Sync>,
    pub oracle: Arc<dyn QuoteOracle + Send + Sync>,
    pub ledger: Ledger,
    pub engine: Arc<SettlementEngine>,
    pub projector: Arc<Projector>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StorePort + Send + Sync>,
        oracle: Arc<dyn QuoteOracle + Send + Sync>,
        config: Arc<dyn ConfigPort + Send + Sync>,
    ) -> Self {
        let ledger = Ledger::new(store.clone());
        let engine = Arc::new(SettlementEngine::new(store.clone(), oracle.clone()));
        let projector = Arc::new(Projector::new(oracle.clone()));
        Self {
            store,
            oracle,
            ledger,
            engine,
            projector,
            config,
        }
    }

    fn starting_cash(&self) -> f64 {
        self.config.get_double("trading", "starting_cash", 10_000.0)
    }
}

pub fn build_router(state: AppState) -> Result<Router, PapertradeError> {
    let session_key = session_key(&*state.config)?;
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_signed(session_key);

    let backend = Backend::new(state.store.clone());
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let router = Router::new()
        .route("/", get(handlers::portfolio))
        .route("/buy", get(handlers::buy_form).post(handlers::buy))
        .route("/sell", get(handlers::sell_form).post(handlers::sell))
        .route("/quote", get(handlers::quote_form).post(handlers::quote))
        .route("/history", get(handlers::history))
        .route(
            "/predict",
            get(handlers::predict_form).post(handlers::predict),
        )
        .route("/logout", post(handlers::logout))
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .nest_service("/static", ServeDir::new("static"))
        .layer(auth_layer)
        .with_state(Arc::new(state));

    Ok(router)
}

/// Cookie-signing key: `[auth] session_secret` as 64+ hex-encoded bytes,
/// or a fresh random key when not configured (sessions then do not survive
/// a restart).
fn session_key(config: &dyn ConfigPort) -> Result<Key, PapertradeError> {
    match config.get_string("auth", "session_secret") {
        Some(secret) => {
            let bytes = hex::decode(secret.trim()).map_err(|e| {
                PapertradeError::ConfigInvalid {
                    section: "auth".into(),
                    key: "session_secret".into(),
                    reason: format!("not valid hex: {e}"),
                }
            })?;
            Key::try_from(bytes.as_slice()).map_err(|_| PapertradeError::ConfigInvalid {
                section: "auth".into(),
                key: "session_secret".into(),
                reason: "must decode to at least 64 bytes".into(),
            })
        }
        None => Ok(Key::generate()),
    }
}
