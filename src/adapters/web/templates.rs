//! HTML templates using Askama.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};

/// Render a template into a 200 response; a render failure is a server
/// error, not a panic.
pub(super) fn page<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("template error: {e}"),
        )
            .into_response(),
    }
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub positions: Vec<PositionRow>,
    pub cash: String,
    pub total: String,
}

pub struct PositionRow {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: String,
    pub value: String,
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate;

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate {
    pub holdings: Vec<HoldingRow>,
}

pub struct HoldingRow {
    pub symbol: String,
    pub shares: i64,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteTemplate;

#[derive(Template)]
#[template(path = "quoted.html")]
pub struct QuotedTemplate {
    pub symbol: String,
    pub name: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub rows: Vec<HistoryRow>,
}

pub struct HistoryRow {
    pub action: &'static str,
    pub symbol: String,
    pub company: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
    pub executed_at: String,
}

#[derive(Template)]
#[template(path = "predict.html")]
pub struct PredictTemplate {
    pub result: Option<PredictResult>,
}

pub struct PredictResult {
    pub prediction_text: String,
    pub advice: String,
    pub caution: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}
