pub mod gift_cards;
pub mod referrals;

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::HttpError;

/// Unwraps a JSON body, turning malformed or mistyped input into a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HttpError::bad_request(rejection.body_text()))
}
