// dtos/giftcarddtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::giftcardmodels::*;
use crate::utils::currency::{from_cents, to_cents};

fn validate_card_code(card_code: &str) -> Result<(), validator::ValidationError> {
    let code = card_code.trim();
    if !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new(
            "card code may only contain letters, digits, '-' and '_'",
        ))
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftCardDto {
    pub issuer_id: Uuid,

    pub issuer_type: IssuerType,

    #[validate(
        length(min = 4, max = 64, message = "Card code must be between 4 and 64 characters"),
        custom = "validate_card_code"
    )]
    pub card_code: String,

    #[validate(range(min = 0.01, max = 100000.0, message = "Amount must be between 0.01 and 100,000"))]
    pub amount: f64,

    pub expiration_date: DateTime<Utc>,

    #[serde(default)]
    pub allowed_transaction_types: Option<Vec<GiftCardTransactionType>>,
}

impl From<CreateGiftCardDto> for NewGiftCard {
    fn from(dto: CreateGiftCardDto) -> Self {
        NewGiftCard {
            card_code: dto.card_code.trim().to_string(),
            issuer_id: dto.issuer_id,
            issuer_type: dto.issuer_type,
            amount: to_cents(dto.amount),
            expiration_date: dto.expiration_date,
            allowed_transaction_types: dto.allowed_transaction_types,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemGiftCardDto {
    #[validate(length(min = 1, message = "Card code is required"))]
    pub card_code: String,

    #[validate(range(min = 0.01, message = "Amount must be greater than 0"))]
    pub amount: f64,

    pub customer_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub customer_name: String,

    pub business_id: Option<Uuid>,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub transaction_type: GiftCardTransactionType,
}

impl From<RedeemGiftCardDto> for Redemption {
    fn from(dto: RedeemGiftCardDto) -> Self {
        Redemption {
            card_code: dto.card_code.trim().to_string(),
            amount: to_cents(dto.amount),
            customer_id: dto.customer_id,
            customer_name: dto.customer_name,
            business_id: dto.business_id,
            order_id: dto.order_id.filter(|id| !id.trim().is_empty()),
            booking_id: dto.booking_id.filter(|id| !id.trim().is_empty()),
            transaction_type: dto.transaction_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerQueryDto {
    pub issuer_id: Option<Uuid>,
    pub issuer_type: Option<IssuerType>,
}

/// Body of deactivate/delete requests: the caller's claimed issuer id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerActionDto {
    pub issuer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardResponseDto {
    pub id: Uuid,
    pub card_code: String,
    pub issuer_id: Uuid,
    pub issuer_type: IssuerType,
    pub amount: f64,
    pub remaining_amount: f64,
    pub is_active: bool,
    pub is_used: bool,
    pub expiration_date: DateTime<Utc>,
    pub allowed_transaction_types: Option<Vec<GiftCardTransactionType>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GiftCard> for GiftCardResponseDto {
    fn from(card: GiftCard) -> Self {
        Self {
            id: card.id,
            card_code: card.card_code,
            issuer_id: card.issuer_id,
            issuer_type: card.issuer_type,
            amount: from_cents(card.amount),
            remaining_amount: from_cents(card.remaining_amount),
            is_active: card.is_active,
            is_used: card.is_used,
            expiration_date: card.expiration_date,
            allowed_transaction_types: card.allowed_transaction_types,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardTransactionResponseDto {
    pub id: Uuid,
    pub card_id: Uuid,
    pub amount_used: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub business_id: Option<Uuid>,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub transaction_type: GiftCardTransactionType,
    pub created_at: DateTime<Utc>,
}

impl From<GiftCardTransaction> for GiftCardTransactionResponseDto {
    fn from(tx: GiftCardTransaction) -> Self {
        Self {
            id: tx.id,
            card_id: tx.card_id,
            amount_used: from_cents(tx.amount_used),
            balance_before: from_cents(tx.balance_before),
            balance_after: from_cents(tx.balance_after),
            customer_id: tx.customer_id,
            customer_name: tx.customer_name,
            business_id: tx.business_id,
            order_id: tx.order_id,
            booking_id: tx.booking_id,
            transaction_type: tx.transaction_type,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponseDto {
    pub card_id: Uuid,
    pub card_code: String,
    pub amount_used: f64,
    pub remaining_amount: f64,
    pub is_used: bool,
    pub transaction_id: Uuid,
}

impl From<RedemptionReceipt> for RedemptionResponseDto {
    fn from(receipt: RedemptionReceipt) -> Self {
        Self {
            card_id: receipt.card_id,
            card_code: receipt.card_code,
            amount_used: from_cents(receipt.amount_used),
            remaining_amount: from_cents(receipt.remaining_amount),
            is_used: receipt.is_used,
            transaction_id: receipt.transaction_id,
        }
    }
}
