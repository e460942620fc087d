// models/giftcardmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::error::GiftCardError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "issuer_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssuerType {
    Seller,
    Coach,
}

impl IssuerType {
    pub fn to_str(&self) -> &str {
        match self {
            IssuerType::Seller => "seller",
            IssuerType::Coach => "coach",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "gift_card_transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GiftCardTransactionType {
    Course,
    Product,
    Token,
}

impl GiftCardTransactionType {
    pub fn to_str(&self) -> &str {
        match self {
            GiftCardTransactionType::Course => "course",
            GiftCardTransactionType::Product => "product",
            GiftCardTransactionType::Token => "token",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GiftCard {
    pub id: Uuid,
    pub card_code: String,
    pub issuer_id: Uuid,
    pub issuer_type: IssuerType,
    pub amount: i64, // in cents
    pub remaining_amount: i64,
    pub is_active: bool,
    pub is_used: bool,
    pub expiration_date: DateTime<Utc>,
    pub allowed_transaction_types: Option<Vec<GiftCardTransactionType>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GiftCardTransaction {
    pub id: Uuid,
    pub card_id: Uuid,
    pub issuer_id: Uuid,
    pub amount_used: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub business_id: Option<Uuid>,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub transaction_type: GiftCardTransactionType,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by an issuer when creating a card.
#[derive(Debug, Clone)]
pub struct NewGiftCard {
    pub card_code: String,
    pub issuer_id: Uuid,
    pub issuer_type: IssuerType,
    pub amount: i64,
    pub expiration_date: DateTime<Utc>,
    pub allowed_transaction_types: Option<Vec<GiftCardTransactionType>>,
}

/// A request to spend part of a card's balance.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub card_code: String,
    pub amount: i64,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub business_id: Option<Uuid>,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub transaction_type: GiftCardTransactionType,
}

impl Redemption {
    /// Checks that do not need the card: a positive amount and at most one
    /// purchase reference, matching the transaction type.
    pub fn validate(&self) -> Result<(), GiftCardError> {
        if self.amount <= 0 {
            return Err(GiftCardError::Validation(
                "Amount must be greater than 0".to_string(),
            ));
        }

        if self.card_code.trim().is_empty() {
            return Err(GiftCardError::Validation("Card code is required".to_string()));
        }

        match (&self.order_id, &self.booking_id) {
            (Some(_), Some(_)) => Err(GiftCardError::Validation(
                "Provide either an order ID or a booking ID, not both".to_string(),
            )),
            (Some(_), None) if self.transaction_type != GiftCardTransactionType::Product => {
                Err(GiftCardError::Validation(
                    "Order ID is only valid for product transactions".to_string(),
                ))
            }
            (None, Some(_)) if self.transaction_type != GiftCardTransactionType::Course => {
                Err(GiftCardError::Validation(
                    "Booking ID is only valid for course transactions".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    pub card_id: Uuid,
    pub card_code: String,
    pub amount_used: i64,
    pub remaining_amount: i64,
    pub is_used: bool,
    pub transaction_id: Uuid,
}

impl GiftCard {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_date
    }

    pub fn allows(&self, transaction_type: GiftCardTransactionType) -> bool {
        match &self.allowed_transaction_types {
            Some(types) if !types.is_empty() => types.contains(&transaction_type),
            _ => true,
        }
    }

    /// Every rule a redemption must pass against the card as currently
    /// stored. Stores call this while holding the card's row lock.
    ///
    /// State checks come before the balance check, so a card drained to zero
    /// by a concurrent redemption reports `AlreadyUsed`, not `InsufficientBalance`.
    pub fn check_redeemable(
        &self,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<(), GiftCardError> {
        if !self.is_active {
            return Err(GiftCardError::Inactive);
        }
        if self.is_used {
            return Err(GiftCardError::AlreadyUsed);
        }
        if self.is_expired(now) {
            return Err(GiftCardError::Expired(self.expiration_date));
        }

        if !self.allows(redemption.transaction_type) {
            let allowed = self
                .allowed_transaction_types
                .iter()
                .flatten()
                .map(|t| t.to_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GiftCardError::TransactionTypeNotAllowed {
                requested: redemption.transaction_type,
                allowed,
            });
        }
        if let Some(business_id) = redemption.business_id {
            if business_id != self.issuer_id {
                return Err(GiftCardError::BusinessMismatch);
            }
        }

        if self.remaining_amount < redemption.amount {
            return Err(GiftCardError::InsufficientBalance {
                requested: redemption.amount,
                available: self.remaining_amount,
            });
        }

        Ok(())
    }
}
