use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use quick_xml::escape::escape;
use serde_json::json;
use std::fmt;

/// Errors surfaced by the HTTP layer.
///
/// Sitemap handlers never produce `NotFound`: every sitemap failure is
/// absorbed by the fetcher's fallback chain. `NotFound` carries the
/// request path of a landing page with no content and renders as an HTML
/// page, since crawlers and browsers are the ones asking.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(what) => write!(f, "Not found: {}", what),
            AppError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(path) => {
                let body = format!(
                    "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"robots\" content=\"noindex\"><title>Page not found</title></head>\n<body><h1>Page not found</h1><p>Nothing is listed at {}.</p></body></html>\n",
                    escape(path.as_str())
                );
                (
                    StatusCode::NOT_FOUND,
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                    body,
                )
                    .into_response()
            }
            AppError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, "60")],
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}

/// Failure talking to the content authority. Both kinds are recovered
/// locally by the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Timeout, connection failure or a non-2xx status.
    Transient(String),
    /// A 2xx response whose body failed validation.
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transient(msg) => write!(f, "Transient remote failure: {}", msg),
            FetchError::Malformed(msg) => write!(f, "Malformed remote payload: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Transient(format!("timed out: {}", err))
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transient(err.to_string())
        }
    }
}

/// Persistence failures from any `CatalogStore` / `PageContentStore`.
#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Unavailable(String),
    Decode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<FetchError> for StoreError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transient(msg) => StoreError::Unavailable(msg),
            FetchError::Malformed(msg) => StoreError::Decode(msg),
        }
    }
}

/// Startup configuration problems.
#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: String, value: String },
    InvalidUrl { key: String, value: String },
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{} must be a non-negative integer, got '{}'", key, value)
            }
            ConfigError::InvalidUrl { key, value } => {
                write!(f, "{} must be an absolute URL, got '{}'", key, value)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "unsupported value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
