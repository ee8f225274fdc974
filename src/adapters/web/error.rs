//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::PapertradeError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PapertradeError> for WebError {
    fn from(err: PapertradeError) -> Self {
        let status = match &err {
            PapertradeError::InvalidInput { .. }
            | PapertradeError::DuplicateUsername { .. } => StatusCode::BAD_REQUEST,
            PapertradeError::SymbolNotFound { .. }
            | PapertradeError::NoData { .. }
            | PapertradeError::InsufficientFunds { .. }
            | PapertradeError::InsufficientShares { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PapertradeError::OracleUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Infrastructure detail stays out of user-facing pages.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            err.to_string()
        };
        Self::new(status, message)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            status: self.status.as_u16(),
            message: self.message.clone(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
