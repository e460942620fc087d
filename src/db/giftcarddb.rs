// db/giftcarddb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::giftcardmodels::*;
use crate::service::error::GiftCardError;

#[async_trait]
pub trait GiftCardExt: Send + Sync {
    async fn get_gift_card(&self, card_id: Uuid) -> Result<Option<GiftCard>, Error>;

    async fn get_gift_card_by_code(&self, card_code: &str) -> Result<Option<GiftCard>, Error>;

    async fn get_gift_cards_by_issuer(
        &self,
        issuer_id: Uuid,
        issuer_type: IssuerType,
    ) -> Result<Vec<GiftCard>, Error>;

    /// Fails with `DuplicateCode` when the code is already taken.
    async fn create_gift_card(&self, new_card: NewGiftCard) -> Result<GiftCard, GiftCardError>;

    async fn deactivate_gift_card(&self, card_id: Uuid) -> Result<GiftCard, Error>;

    /// Returns false when no card had that id.
    async fn delete_gift_card(&self, card_id: Uuid) -> Result<bool, Error>;

    /// Validates, decrements and records a redemption as one unit. Two
    /// concurrent calls against the same card are serialized by the store.
    async fn redeem_gift_card(
        &self,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<RedemptionReceipt, GiftCardError>;

    async fn get_gift_card_transactions_by_issuer(
        &self,
        issuer_id: Uuid,
    ) -> Result<Vec<GiftCardTransaction>, Error>;
}

impl std::fmt::Debug for dyn GiftCardExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GiftCardExt")
    }
}

#[async_trait]
impl GiftCardExt for DBClient {
    async fn get_gift_card(&self, card_id: Uuid) -> Result<Option<GiftCard>, Error> {
        sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            FROM gift_cards
            WHERE id = $1
            "#
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_gift_card_by_code(&self, card_code: &str) -> Result<Option<GiftCard>, Error> {
        sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            FROM gift_cards
            WHERE card_code = $1
            "#
        )
        .bind(card_code.trim())
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_gift_cards_by_issuer(
        &self,
        issuer_id: Uuid,
        issuer_type: IssuerType,
    ) -> Result<Vec<GiftCard>, Error> {
        sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            FROM gift_cards
            WHERE issuer_id = $1 AND issuer_type = $2
            ORDER BY created_at DESC
            "#
        )
        .bind(issuer_id)
        .bind(issuer_type)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_gift_card(&self, new_card: NewGiftCard) -> Result<GiftCard, GiftCardError> {
        let card_code = new_card.card_code.trim().to_string();

        sqlx::query_as::<_, GiftCard>(
            r#"
            INSERT INTO gift_cards
            (card_code, issuer_id, issuer_type, amount, remaining_amount,
             is_active, is_used, expiration_date, allowed_transaction_types)
            VALUES ($1, $2, $3, $4, $4, TRUE, FALSE, $5, $6)
            RETURNING
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            "#
        )
        .bind(&card_code)
        .bind(new_card.issuer_id)
        .bind(new_card.issuer_type)
        .bind(new_card.amount)
        .bind(new_card.expiration_date)
        .bind(new_card.allowed_transaction_types)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => GiftCardError::DuplicateCode(card_code),
            _ => GiftCardError::Database(e),
        })
    }

    async fn deactivate_gift_card(&self, card_id: Uuid) -> Result<GiftCard, Error> {
        sqlx::query_as::<_, GiftCard>(
            r#"
            UPDATE gift_cards
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            "#
        )
        .bind(card_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_gift_card(&self, card_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM gift_cards WHERE id = $1")
            .bind(card_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem_gift_card(
        &self,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<RedemptionReceipt, GiftCardError> {
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent redemption of the same card waits here.
        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            FROM gift_cards
            WHERE card_code = $1
            FOR UPDATE
            "#
        )
        .bind(redemption.card_code.trim())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| GiftCardError::NotFound(redemption.card_code.clone()))?;

        card.check_redeemable(redemption, now)?;

        let updated = sqlx::query_as::<_, GiftCard>(
            r#"
            UPDATE gift_cards
            SET remaining_amount = remaining_amount - $2,
                is_used = (remaining_amount - $2 = 0),
                updated_at = NOW()
            WHERE id = $1 AND remaining_amount >= $2
            RETURNING
                id,
                card_code,
                issuer_id,
                issuer_type,
                amount,
                remaining_amount,
                is_active,
                is_used,
                expiration_date,
                allowed_transaction_types,
                created_at,
                updated_at
            "#
        )
        .bind(card.id)
        .bind(redemption.amount)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GiftCardError::InsufficientBalance {
            requested: redemption.amount,
            available: card.remaining_amount,
        })?;

        let transaction_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO gift_card_transactions
            (card_id, issuer_id, amount_used, balance_before, balance_after, customer_id,
             customer_name, business_id, order_id, booking_id, transaction_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#
        )
        .bind(card.id)
        .bind(card.issuer_id)
        .bind(redemption.amount)
        .bind(card.remaining_amount)
        .bind(updated.remaining_amount)
        .bind(redemption.customer_id)
        .bind(&redemption.customer_name)
        .bind(redemption.business_id)
        .bind(&redemption.order_id)
        .bind(&redemption.booking_id)
        .bind(redemption.transaction_type)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RedemptionReceipt {
            card_id: updated.id,
            card_code: updated.card_code,
            amount_used: redemption.amount,
            remaining_amount: updated.remaining_amount,
            is_used: updated.is_used,
            transaction_id,
        })
    }

    async fn get_gift_card_transactions_by_issuer(
        &self,
        issuer_id: Uuid,
    ) -> Result<Vec<GiftCardTransaction>, Error> {
        sqlx::query_as::<_, GiftCardTransaction>(
            r#"
            SELECT
                id,
                card_id,
                issuer_id,
                amount_used,
                balance_before,
                balance_after,
                customer_id,
                customer_name,
                business_id,
                order_id,
                booking_id,
                transaction_type,
                created_at
            FROM gift_card_transactions
            WHERE issuer_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(issuer_id)
        .fetch_all(&self.pool)
        .await
    }
}
