// service/gift_card_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::giftcarddb::GiftCardExt,
    models::giftcardmodels::*,
    service::error::GiftCardError,
    utils::currency::format_cents,
};

#[derive(Debug, Clone)]
pub struct GiftCardService {
    store: Arc<dyn GiftCardExt>,
}

impl GiftCardService {
    pub fn new(store: Arc<dyn GiftCardExt>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, card_id: Uuid) -> Result<Option<GiftCard>, GiftCardError> {
        Ok(self.store.get_gift_card(card_id).await?)
    }

    pub async fn get_by_card_code(&self, card_code: &str) -> Result<Option<GiftCard>, GiftCardError> {
        Ok(self.store.get_gift_card_by_code(card_code).await?)
    }

    pub async fn get_by_issuer(
        &self,
        issuer_id: Uuid,
        issuer_type: IssuerType,
    ) -> Result<Vec<GiftCard>, GiftCardError> {
        Ok(self.store.get_gift_cards_by_issuer(issuer_id, issuer_type).await?)
    }

    pub async fn create(&self, new_card: NewGiftCard) -> Result<GiftCard, GiftCardError> {
        if new_card.card_code.trim().is_empty() {
            return Err(GiftCardError::Validation("Card code is required".to_string()));
        }
        if new_card.amount <= 0 {
            return Err(GiftCardError::Validation(
                "Amount must be greater than 0".to_string(),
            ));
        }
        if new_card.expiration_date <= Utc::now() {
            return Err(GiftCardError::Validation(
                "Expiration date must be in the future".to_string(),
            ));
        }

        // The unique index on card_code still decides under a race.
        if self.store.get_gift_card_by_code(&new_card.card_code).await?.is_some() {
            return Err(GiftCardError::DuplicateCode(new_card.card_code.trim().to_string()));
        }

        let card = self.store.create_gift_card(new_card).await?;
        tracing::info!(
            "gift card {} issued by {} {} for {}",
            card.id,
            card.issuer_type.to_str(),
            card.issuer_id,
            format_cents(card.amount)
        );
        Ok(card)
    }

    async fn owned_card(&self, card_id: Uuid, issuer_id: Uuid) -> Result<GiftCard, GiftCardError> {
        let card = self
            .store
            .get_gift_card(card_id)
            .await?
            .ok_or_else(|| GiftCardError::NotFound(card_id.to_string()))?;

        if card.issuer_id != issuer_id {
            tracing::warn!("issuer {} attempted to modify gift card {}", issuer_id, card_id);
            return Err(GiftCardError::NotIssuer(card_id));
        }
        Ok(card)
    }

    pub async fn deactivate(&self, card_id: Uuid, issuer_id: Uuid) -> Result<GiftCard, GiftCardError> {
        self.owned_card(card_id, issuer_id).await?;
        let card = self.store.deactivate_gift_card(card_id).await?;
        tracing::info!("gift card {} deactivated", card_id);
        Ok(card)
    }

    pub async fn delete(&self, card_id: Uuid, issuer_id: Uuid) -> Result<(), GiftCardError> {
        self.owned_card(card_id, issuer_id).await?;
        if !self.store.delete_gift_card(card_id).await? {
            return Err(GiftCardError::NotFound(card_id.to_string()));
        }
        tracing::info!("gift card {} deleted", card_id);
        Ok(())
    }

    pub async fn validate_and_use(&self, redemption: Redemption) -> Result<RedemptionReceipt, GiftCardError> {
        redemption.validate()?;

        match self.store.redeem_gift_card(&redemption, Utc::now()).await {
            Ok(receipt) => {
                tracing::info!(
                    "gift card {} redeemed for {} ({}), remaining {}",
                    receipt.card_id,
                    format_cents(receipt.amount_used),
                    redemption.transaction_type.to_str(),
                    format_cents(receipt.remaining_amount)
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::debug!("gift card redemption rejected: {}", e);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GiftCardTransactionService {
    store: Arc<dyn GiftCardExt>,
}

impl GiftCardTransactionService {
    pub fn new(store: Arc<dyn GiftCardExt>) -> Self {
        Self { store }
    }

    pub async fn get_by_issuer(&self, issuer_id: Uuid) -> Result<Vec<GiftCardTransaction>, GiftCardError> {
        Ok(self.store.get_gift_card_transactions_by_issuer(issuer_id).await?)
    }
}
