use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use auth::{
    Claims, ClaimsEnricher, CurrentUser, EnrichFuture, RESERVED_CLAIMS, SettingsEnricher,
    TokenError, TokenIssuer,
};
pub use server::{ServerState, router, run_with_listener};

mod accounts;
mod auth;
mod logs;
mod server;
mod settings;
mod transactions;

pub enum ServerError {
    Engine(EngineError),
    Unauthorized(String),
    Internal(String),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Database(_) | EngineError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidSettings(_)
        | EngineError::InvalidFilter(_)
        | EngineError::UnsupportedCurrency(_)
        | EngineError::InvalidCredentials(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

pub(crate) fn api_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
        engine::Currency::Chf => api_types::Currency::Chf,
        engine::Currency::Jpy => api_types::Currency::Jpy,
    }
}

pub(crate) fn engine_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
        api_types::Currency::Chf => engine::Currency::Chf,
        api_types::Currency::Jpy => engine::Currency::Jpy,
    }
}

pub(crate) fn page_response<T, U>(
    page: engine::Page<T>,
    view: impl FnMut(T) -> U,
) -> api_types::PageResponse<U> {
    let page = page.map(view);
    api_types::PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<TokenError> for ServerError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Engine(err) => Self::Engine(err),
            err @ TokenError::InvalidTtl => Self::Internal(err.to_string()),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}
