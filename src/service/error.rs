use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::giftcardmodels::GiftCardTransactionType,
};

/// Closed set of failure categories. Handlers pick a status code from this,
/// never from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidScope,
    InsufficientBalance,
    Validation,
    Conflict,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidState
            | ErrorKind::InvalidScope
            | ErrorKind::InsufficientBalance
            | ErrorKind::Validation
            | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Error, Debug)]
pub enum GiftCardError {
    #[error("Gift card not found")]
    NotFound(String),

    #[error("Gift card is not active")]
    Inactive,

    #[error("Gift card has already been used")]
    AlreadyUsed,

    #[error("Gift card expired on {}", .0.format("%Y-%m-%d"))]
    Expired(DateTime<Utc>),

    #[error("This gift card can only be used with {allowed} purchases, not {}", .requested.to_str())]
    TransactionTypeNotAllowed {
        requested: GiftCardTransactionType,
        allowed: String,
    },

    #[error("This gift card can only be used with the business that issued it")]
    BusinessMismatch,

    #[error("Insufficient gift card balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Gift card code already exists")]
    DuplicateCode(String),

    #[error("Unauthorized: you are not the issuer of gift card {0}")]
    NotIssuer(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GiftCardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GiftCardError::NotFound(_) => ErrorKind::NotFound,
            GiftCardError::Inactive | GiftCardError::AlreadyUsed | GiftCardError::Expired(_) => {
                ErrorKind::InvalidState
            }
            GiftCardError::TransactionTypeNotAllowed { .. } | GiftCardError::BusinessMismatch => {
                ErrorKind::InvalidScope
            }
            GiftCardError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            GiftCardError::DuplicateCode(_) => ErrorKind::Conflict,
            GiftCardError::NotIssuer(_) => ErrorKind::Forbidden,
            GiftCardError::Validation(_) => ErrorKind::Validation,
            GiftCardError::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<GiftCardError> for HttpError {
    fn from(error: GiftCardError) -> Self {
        let kind = error.kind();
        match kind {
            ErrorKind::Internal => {
                tracing::error!("gift card store failure: {}", error);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            ErrorKind::Forbidden => HttpError::forbidden(ErrorMessage::NotCardIssuer.to_string()),
            _ => HttpError::new(error.to_string(), kind.status_code()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReferralError {
    #[error("User not found")]
    UserNotFound(Uuid),

    #[error("No user registered with email {0}")]
    EmailNotFound(String),

    #[error("Referral code not found")]
    CodeNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ReferralError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReferralError::UserNotFound(_)
            | ReferralError::EmailNotFound(_)
            | ReferralError::CodeNotFound(_) => ErrorKind::NotFound,
            ReferralError::Validation(_) => ErrorKind::Validation,
            ReferralError::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<ReferralError> for HttpError {
    fn from(error: ReferralError) -> Self {
        match error.kind() {
            ErrorKind::Internal => {
                tracing::error!("referral store failure: {}", error);
                HttpError::server_error("Failed to process referral request")
            }
            kind => HttpError::new(error.to_string(), kind.status_code()),
        }
    }
}
