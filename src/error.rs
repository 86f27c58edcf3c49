//! Error types for progression, the ledger, configuration and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::protocol::FieldError;

/// Failures of the level table and the progression math.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("invalid xp total {0}: must be a non-negative integer")]
    InvalidXp(i64),

    #[error("invalid level table: {0}")]
    InvalidLevelTable(String),

    #[error("no level covers {xp} xp: the table needs a level with a zero threshold")]
    NoLevelForXp { xp: u64 },
}

pub type ProgressionResult<T> = Result<T, ProgressionError>;

/// Failures reported by the experience ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("entry rejected: {0}")]
    Rejected(String),

    #[error("entry {entry_id} not found for user {user_id}")]
    EntryNotFound { user_id: String, entry_id: String },

    #[error("entry {0} has already been reversed")]
    AlreadyReversed(String),

    #[error("entry {0} is a reversal and cannot itself be reversed")]
    NotReversible(String),

    #[error("entry would leave user {user_id} with a negative xp total ({total})")]
    NegativeTotal { user_id: String, total: i64 },

    #[error("xp total for user {0} overflowed")]
    TotalOverflow(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Startup configuration failures. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("configured level table rejected: {0}")]
    Levels(#[from] ProgressionError),
}

/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("level table rejected: {0}")]
    LevelTableRejected(ProgressionError),

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::LevelTableRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Progression(ProgressionError::InvalidXp(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Progression(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(LedgerError::Rejected(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::EntryNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Ledger(LedgerError::AlreadyReversed(_)) => StatusCode::CONFLICT,
            ApiError::Ledger(LedgerError::NotReversible(_)) => StatusCode::CONFLICT,
            ApiError::Ledger(LedgerError::NegativeTotal { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Ledger(LedgerError::TotalOverflow(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::LevelTableRejected(_) => "LEVEL_TABLE_REJECTED",
            ApiError::Progression(ProgressionError::InvalidXp(_)) => "INVALID_XP",
            ApiError::Progression(ProgressionError::InvalidLevelTable(_)) => "INVALID_LEVEL_TABLE",
            ApiError::Progression(ProgressionError::NoLevelForXp { .. }) => "NO_LEVEL_FOR_XP",
            ApiError::Ledger(LedgerError::Rejected(_)) => "LEDGER_REJECTED",
            ApiError::Ledger(LedgerError::EntryNotFound { .. }) => "NOT_FOUND",
            ApiError::Ledger(LedgerError::AlreadyReversed(_)) => "ALREADY_REVERSED",
            ApiError::Ledger(LedgerError::NotReversible(_)) => "NOT_REVERSIBLE",
            ApiError::Ledger(LedgerError::NegativeTotal { .. }) => "NEGATIVE_TOTAL",
            ApiError::Ledger(LedgerError::TotalOverflow(_)) => "TOTAL_OVERFLOW",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();
        let error = self.to_string();
        let details = match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        };

        (status, Json(ErrorResponse { error, code, details })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
