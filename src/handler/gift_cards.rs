// handler/gift_cards.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{giftcarddtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    handler::json_body,
    AppState,
};

pub fn gift_card_handler() -> Router {
    Router::new()
        .route("/", get(get_gift_cards).post(create_gift_card))
        .route("/validate", post(validate_gift_card))
        .route("/transactions", get(get_gift_card_transactions))
        .route("/code/:card_code", get(get_gift_card_by_code))
        .route("/:card_id", get(get_gift_card).delete(delete_gift_card))
        .route("/:card_id/deactivate", put(deactivate_gift_card))
}

pub async fn get_gift_cards(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<IssuerQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (issuer_id, issuer_type) = match (query.issuer_id, query.issuer_type) {
        (Some(id), Some(issuer_type)) => (id, issuer_type),
        _ => return Err(HttpError::bad_request("Issuer ID and type are required")),
    };

    let cards = app_state
        .gift_card_service
        .get_by_issuer(issuer_id, issuer_type)
        .await?;

    let response: Vec<GiftCardResponseDto> = cards.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success("Gift cards retrieved successfully", response)))
}

pub async fn create_gift_card(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateGiftCardDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let card = app_state.gift_card_service.create(body.into()).await?;

    let response: GiftCardResponseDto = card.into();
    Ok(Json(ApiResponse::success("Gift card created successfully", response)))
}

pub async fn get_gift_card(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let card = app_state
        .gift_card_service
        .get_by_id(card_id)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::GiftCardNotFound.to_string()))?;

    let response: GiftCardResponseDto = card.into();
    Ok(Json(ApiResponse::success("Gift card retrieved successfully", response)))
}

pub async fn get_gift_card_by_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(card_code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let card = app_state
        .gift_card_service
        .get_by_card_code(&card_code)
        .await?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::GiftCardNotFound.to_string()))?;

    let response: GiftCardResponseDto = card.into();
    Ok(Json(ApiResponse::success("Gift card retrieved successfully", response)))
}

pub async fn validate_gift_card(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<RedeemGiftCardDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body = json_body(payload)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let receipt = app_state
        .gift_card_service
        .validate_and_use(body.into())
        .await?;

    let response: RedemptionResponseDto = receipt.into();
    Ok(Json(ApiResponse::success(
        "Gift card validated and used successfully",
        response,
    )))
}

pub async fn deactivate_gift_card(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    payload: Result<Json<IssuerActionDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let issuer_id = json_body(payload)?
        .issuer_id
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::IssuerIdRequired.to_string()))?;

    let card = app_state
        .gift_card_service
        .deactivate(card_id, issuer_id)
        .await?;

    let response: GiftCardResponseDto = card.into();
    Ok(Json(ApiResponse::success("Gift card deactivated successfully", response)))
}

pub async fn delete_gift_card(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    payload: Result<Json<IssuerActionDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let issuer_id = json_body(payload)?
        .issuer_id
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::IssuerIdRequired.to_string()))?;

    app_state
        .gift_card_service
        .delete(card_id, issuer_id)
        .await?;

    Ok(Json(ApiResponse::message("Gift card deleted successfully")))
}

pub async fn get_gift_card_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<IssuerQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let issuer_id = query
        .issuer_id
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::IssuerIdRequired.to_string()))?;

    let transactions = app_state
        .gift_card_transaction_service
        .get_by_issuer(issuer_id)
        .await?;

    let response: Vec<GiftCardTransactionResponseDto> =
        transactions.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        "Gift card transactions retrieved successfully",
        response,
    )))
}
