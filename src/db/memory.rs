// db/memory.rs
//! In-memory stand-in for `DBClient`, used by unit and router tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{giftcarddb::GiftCardExt, referraldb::ReferralExt, userdb::UserExt};
use crate::models::{
    giftcardmodels::*,
    referralmodel::{NewReferral, Referral, ReferralStatus},
    usermodel::User,
};
use crate::service::error::GiftCardError;

#[derive(Default)]
struct State {
    cards: HashMap<Uuid, GiftCard>,
    transactions: Vec<GiftCardTransaction>,
    users: HashMap<Uuid, User>,
    referrals: Vec<Referral>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// When set, every referral code is reported as taken.
    pub force_code_collisions: AtomicBool,
    /// When set, the next `create_referral` fails without persisting anything.
    pub fail_next_referral: AtomicBool,
    /// Delay applied to each referral code lookup, in milliseconds.
    pub code_check_delay_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_card(&self, card: GiftCard) {
        self.state.lock().unwrap().cards.insert(card.id, card);
    }

    pub fn card(&self, card_id: Uuid) -> Option<GiftCard> {
        self.state.lock().unwrap().cards.get(&card_id).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    pub fn insert_user(&self, first_name: &str, last_name: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            referral_code: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().users.insert(user.id, user.clone());
        user
    }

    pub fn collide_all_codes(&self) {
        self.force_code_collisions.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_referral(&self) {
        self.fail_next_referral.store(true, Ordering::SeqCst);
    }

    pub fn slow_code_checks(&self, millis: u64) {
        self.code_check_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn user(&self, user_id: Uuid) -> Option<User> {
        self.state.lock().unwrap().users.get(&user_id).cloned()
    }

    /// Stores a referral as-is, without touching the sponsor's user record.
    pub fn insert_referral(&self, referral: Referral) {
        self.state.lock().unwrap().referrals.push(referral);
    }

    pub fn referral_count(&self) -> usize {
        self.state.lock().unwrap().referrals.len()
    }
}

#[async_trait]
impl GiftCardExt for MemoryStore {
    async fn get_gift_card(&self, card_id: Uuid) -> Result<Option<GiftCard>, sqlx::Error> {
        Ok(self.card(card_id))
    }

    async fn get_gift_card_by_code(&self, card_code: &str) -> Result<Option<GiftCard>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cards
            .values()
            .find(|c| c.card_code == card_code.trim())
            .cloned())
    }

    async fn get_gift_cards_by_issuer(
        &self,
        issuer_id: Uuid,
        issuer_type: IssuerType,
    ) -> Result<Vec<GiftCard>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut cards: Vec<GiftCard> = state
            .cards
            .values()
            .filter(|c| c.issuer_id == issuer_id && c.issuer_type == issuer_type)
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    async fn create_gift_card(&self, new_card: NewGiftCard) -> Result<GiftCard, GiftCardError> {
        let mut state = self.state.lock().unwrap();
        let card_code = new_card.card_code.trim().to_string();
        if state.cards.values().any(|c| c.card_code == card_code) {
            return Err(GiftCardError::DuplicateCode(card_code));
        }

        let now = Utc::now();
        let card = GiftCard {
            id: Uuid::new_v4(),
            card_code,
            issuer_id: new_card.issuer_id,
            issuer_type: new_card.issuer_type,
            amount: new_card.amount,
            remaining_amount: new_card.amount,
            is_active: true,
            is_used: false,
            expiration_date: new_card.expiration_date,
            allowed_transaction_types: new_card.allowed_transaction_types,
            created_at: now,
            updated_at: now,
        };
        state.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn deactivate_gift_card(&self, card_id: Uuid) -> Result<GiftCard, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let card = state.cards.get_mut(&card_id).ok_or(sqlx::Error::RowNotFound)?;
        card.is_active = false;
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn delete_gift_card(&self, card_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.state.lock().unwrap().cards.remove(&card_id).is_some())
    }

    async fn redeem_gift_card(
        &self,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<RedemptionReceipt, GiftCardError> {
        // One lock across check, decrement and ledger write.
        let mut state = self.state.lock().unwrap();
        let card = state
            .cards
            .values_mut()
            .find(|c| c.card_code == redemption.card_code.trim())
            .ok_or_else(|| GiftCardError::NotFound(redemption.card_code.clone()))?;

        card.check_redeemable(redemption, now)?;

        let balance_before = card.remaining_amount;
        card.remaining_amount -= redemption.amount;
        card.is_used = card.remaining_amount == 0;
        card.updated_at = now;
        let card = card.clone();

        let transaction = GiftCardTransaction {
            id: Uuid::new_v4(),
            card_id: card.id,
            issuer_id: card.issuer_id,
            amount_used: redemption.amount,
            balance_before,
            balance_after: card.remaining_amount,
            customer_id: redemption.customer_id,
            customer_name: redemption.customer_name.clone(),
            business_id: redemption.business_id,
            order_id: redemption.order_id.clone(),
            booking_id: redemption.booking_id.clone(),
            transaction_type: redemption.transaction_type,
            created_at: now,
        };
        let transaction_id = transaction.id;
        state.transactions.push(transaction);

        Ok(RedemptionReceipt {
            card_id: card.id,
            card_code: card.card_code,
            amount_used: redemption.amount,
            remaining_amount: card.remaining_amount,
            is_used: card.is_used,
            transaction_id,
        })
    }

    async fn get_gift_card_transactions_by_issuer(
        &self,
        issuer_id: Uuid,
    ) -> Result<Vec<GiftCardTransaction>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.issuer_id == issuer_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.state.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.referral_code.as_deref() == Some(referral_code))
            .cloned())
    }

    async fn update_user_referral_code(
        &self,
        user_id: Uuid,
        referral_code: String,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(&user_id).ok_or(sqlx::Error::RowNotFound)?;
        user.referral_code = Some(referral_code);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ReferralExt for MemoryStore {
    async fn referral_code_exists(&self, referral_code: &str) -> Result<bool, sqlx::Error> {
        let delay = self.code_check_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.force_code_collisions.load(Ordering::SeqCst) {
            return Ok(true);
        }
        let state = self.state.lock().unwrap();
        Ok(state.referrals.iter().any(|r| r.referral_code == referral_code)
            || state
                .users
                .values()
                .any(|u| u.referral_code.as_deref() == Some(referral_code)))
    }

    async fn get_referral_by_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .referrals
            .iter()
            .find(|r| r.referral_code == referral_code)
            .cloned())
    }

    async fn get_referral_by_sponsor(
        &self,
        sponsor_id: Uuid,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .referrals
            .iter()
            .rev()
            .find(|r| r.sponsor_id == sponsor_id)
            .cloned())
    }

    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, sqlx::Error> {
        if self.fail_next_referral.swap(false, Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&referral.sponsor_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let existing = state
            .referrals
            .iter()
            .find(|r| r.sponsor_id == referral.sponsor_id)
            .cloned();
        let referral = match existing {
            Some(existing) => existing,
            None => {
                let now = Utc::now();
                let created = Referral {
                    id: Uuid::new_v4(),
                    referral_code: referral.referral_code,
                    sponsor_id: referral.sponsor_id,
                    sponsor_name: referral.sponsor_name,
                    sponsor_email: referral.sponsor_email,
                    status: ReferralStatus::Active,
                    usage_count: 0,
                    created_at: now,
                    updated_at: now,
                };
                state.referrals.push(created.clone());
                created
            }
        };

        if let Some(user) = state.users.get_mut(&referral.sponsor_id) {
            user.referral_code = Some(referral.referral_code.clone());
            user.updated_at = Utc::now();
        }
        Ok(referral)
    }

    async fn increment_referral_usage(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .referrals
            .iter_mut()
            .find(|r| r.referral_code == referral_code && r.status == ReferralStatus::Active)
            .map(|r| {
                r.usage_count += 1;
                r.updated_at = Utc::now();
                r.clone()
            }))
    }
}
