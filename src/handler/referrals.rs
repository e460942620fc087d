// handler/referrals.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::{
    dtos::{referraldtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    handler::json_body,
    AppState,
};

pub fn referral_handler() -> Router {
    Router::new()
        .route("/generate-code", post(generate_referral_code))
        .route("/validate", post(validate_referral_code_body))
        .route("/validate/:code", get(validate_referral_code))
        .route("/:code", get(get_referral))
        .route("/:code/use", post(record_referral_usage))
}

pub async fn generate_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<GenerateReferralCodeDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;

    let referral = match (body.user_id, body.email) {
        (Some(user_id), _) => app_state.referral_service.generate_for_user(user_id).await?,
        (None, Some(email)) => app_state.referral_service.generate_for_email(&email).await?,
        (None, None) => {
            return Err(HttpError::bad_request(ErrorMessage::UserIdRequired.to_string()))
        }
    };

    let response: ReferralResponseDto = referral.into();
    Ok(Json(ApiResponse::success(
        "Referral code generated successfully",
        response,
    )))
}

pub async fn validate_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let sponsor = app_state.referral_service.validate_code(&code).await?;

    Ok(Json(ReferralValidationDto::from_lookup(sponsor)))
}

pub async fn validate_referral_code_body(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<ValidateReferralCodeDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;
    let sponsor = app_state
        .referral_service
        .validate_code(&body.referral_code)
        .await?;

    Ok(Json(ReferralValidationDto::from_lookup(sponsor)))
}

pub async fn get_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let referral = app_state.referral_service.get_by_code(&code).await?;

    let response: ReferralResponseDto = referral.into();
    Ok(Json(ApiResponse::success("Referral retrieved successfully", response)))
}

pub async fn record_referral_usage(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let referral = app_state.referral_service.record_usage(&code).await?;

    let response: ReferralResponseDto = referral.into();
    Ok(Json(ApiResponse::success("Referral usage recorded", response)))
}
