//! HTTP request handlers.
//!
//! Handlers take an already-authenticated user from the session; access
//! control itself is the router's `login_required` layer. Anything that can
//! touch the quote provider or do database work runs under
//! `spawn_blocking`, since the ports are synchronous.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::domain::error::PapertradeError;
use crate::domain::money::usd;
use crate::domain::quote::normalize_symbol;

use super::auth::{hash_password, Backend, Credentials, WebUser};
use super::templates::*;
use super::{AppState, WebError};

pub type AuthSession = axum_login::AuthSession<Backend>;

fn join_err(e: tokio::task::JoinError) -> WebError {
    WebError::internal(format!("task failed: {e}"))
}

fn require_user(auth_session: &AuthSession) -> Result<WebUser, WebError> {
    auth_session
        .user
        .clone()
        .ok_or_else(|| WebError::new(axum::http::StatusCode::UNAUTHORIZED, "login required"))
}

// --- portfolio -----------------------------------------------------------

pub async fn portfolio(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;

    let ledger = state.ledger.clone();
    let oracle = state.oracle.clone();
    let view = tokio::task::spawn_blocking(move || ledger.portfolio(user.id, &*oracle))
        .await
        .map_err(join_err)??;

    let positions = view
        .positions
        .into_iter()
        .map(|p| PositionRow {
            symbol: p.symbol,
            name: p.name,
            shares: p.shares,
            price: usd(p.price),
            value: usd(p.value),
        })
        .collect();

    Ok(page(PortfolioTemplate {
        positions,
        cash: usd(view.cash),
        total: usd(view.total),
    }))
}

// --- buy / sell ----------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
pub struct TradeForm {
    pub symbol: String,
    pub shares: String,
}

fn parse_shares(raw: &str) -> Result<i64, WebError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| WebError::bad_request("share count must be a positive integer"))
}

pub async fn buy_form(auth_session: AuthSession) -> Result<Response, WebError> {
    require_user(&auth_session)?;
    Ok(page(BuyTemplate))
}

pub async fn buy(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;
    let shares = parse_shares(&form.shares)?;

    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || engine.buy(user.id, &form.symbol, shares))
        .await
        .map_err(join_err)??;

    Ok(Redirect::to("/").into_response())
}

pub async fn sell_form(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;

    let ledger = state.ledger.clone();
    let holdings = tokio::task::spawn_blocking(move || ledger.holdings(user.id))
        .await
        .map_err(join_err)??;

    let holdings = holdings
        .into_iter()
        .map(|h| HoldingRow {
            symbol: h.symbol,
            shares: h.shares,
        })
        .collect();

    Ok(page(SellTemplate { holdings }))
}

pub async fn sell(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;
    let shares = parse_shares(&form.shares)?;

    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || engine.sell(user.id, &form.symbol, shares))
        .await
        .map_err(join_err)??;

    Ok(Redirect::to("/").into_response())
}

// --- quote ---------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
pub struct SymbolForm {
    pub symbol: String,
}

pub async fn quote_form(auth_session: AuthSession) -> Result<Response, WebError> {
    require_user(&auth_session)?;
    Ok(page(QuoteTemplate))
}

pub async fn quote(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
    Form(form): Form<SymbolForm>,
) -> Result<Response, WebError> {
    require_user(&auth_session)?;
    let symbol = normalize_symbol(&form.symbol);
    if symbol.is_empty() {
        return Err(WebError::bad_request("symbol is required"));
    }

    let oracle = state.oracle.clone();
    let looked_up = symbol.clone();
    let quote = tokio::task::spawn_blocking(move || oracle.lookup(&looked_up))
        .await
        .map_err(join_err)??
        .ok_or(PapertradeError::SymbolNotFound { symbol })?;

    Ok(page(QuotedTemplate {
        symbol: quote.symbol,
        name: quote.name,
        price: usd(quote.price),
    }))
}

// --- history -------------------------------------------------------------

pub async fn history(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;

    let ledger = state.ledger.clone();
    let transactions = tokio::task::spawn_blocking(move || ledger.transactions(user.id))
        .await
        .map_err(join_err)??;

    let rows = transactions
        .into_iter()
        .map(|t| HistoryRow {
            action: if t.is_buy() { "Buy" } else { "Sell" },
            symbol: t.symbol,
            company: t.company,
            shares: t.shares.abs(),
            price: usd(t.price),
            total: usd(t.total),
            executed_at: t.executed_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(page(HistoryTemplate { rows }))
}

// --- predict -------------------------------------------------------------

pub async fn predict_form(auth_session: AuthSession) -> Result<Response, WebError> {
    require_user(&auth_session)?;
    Ok(page(PredictTemplate { result: None }))
}

pub async fn predict(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
    Form(form): Form<SymbolForm>,
) -> Result<Response, WebError> {
    let user = require_user(&auth_session)?;

    let projector = state.projector.clone();
    let store = state.store.clone();
    let symbol = form.symbol.clone();
    let (projection, held) = tokio::task::spawn_blocking(move || {
        let projection = projector.project(&symbol)?;
        let held = store.net_shares(user.id, &projection.symbol)? > 0;
        Ok::<_, PapertradeError>((projection, held))
    })
    .await
    .map_err(join_err)??;

    let prices = format!(
        "the current price of {} is {} and the predicted price after 1 year is {}.",
        projection.symbol,
        usd(projection.current_price),
        usd(projection.projected_price),
    );
    let prediction_text = if held {
        format!("You currently hold this stock - {prices}")
    } else {
        let mut text = prices;
        text[..1].make_ascii_uppercase();
        text
    };

    let advice = if !held {
        String::new()
    } else if projection.projected_price > projection.current_price {
        "Future price is greater. Consider keeping the stock for potential gains.".to_string()
    } else {
        "Current price is greater. You might want to sell the stock to avoid losses."
            .to_string()
    };

    let caution = if projection.fit_quality_pct < 50.0 {
        "This is a volatile stock. Be cautious when considering this prediction.".to_string()
    } else {
        String::new()
    };

    Ok(page(PredictTemplate {
        result: Some(PredictResult {
            prediction_text,
            advice,
            caution,
        }),
    }))
}

// --- auth ----------------------------------------------------------------

pub async fn login_form() -> Response {
    page(LoginTemplate { error: None })
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(creds): Form<Credentials>,
) -> Result<Response, WebError> {
    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(page(LoginTemplate {
                error: Some("Invalid username or password".to_string()),
            }));
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

    Ok(Redirect::to("/").into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/login").into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirmation: String,
}

pub async fn register_form() -> Response {
    page(RegisterTemplate { error: None })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim().to_string();
    let error = if username.is_empty() {
        Some("Username is required")
    } else if form.password.is_empty() {
        Some("Password is required")
    } else if form.password != form.confirmation {
        Some("Passwords do not match")
    } else {
        None
    };
    if let Some(error) = error {
        return Ok(page(RegisterTemplate {
            error: Some(error.to_string()),
        }));
    }

    let store = state.store.clone();
    let starting_cash = state.starting_cash();
    let created = tokio::task::spawn_blocking(move || {
        let password_hash = hash_password(&form.password)?;
        store.create_user(&username, &password_hash, starting_cash)
    })
    .await
    .map_err(join_err)?;

    match created {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(PapertradeError::DuplicateUsername { username }) => Ok(page(RegisterTemplate {
            error: Some(format!("Username already taken: {username}")),
        })),
        Err(e) => Err(WebError::from(e)),
    }
}
