// service/referral.rs
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::{
    db::{referraldb::ReferralExt, userdb::UserExt},
    models::referralmodel::{NewReferral, Referral, ReferralSponsor},
    service::error::ReferralError,
};

pub const BASE36_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NAME_PART_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferralSettings {
    pub max_attempts: u32,
    pub suffix_length: usize,
    pub suffix_alphabet: String,
}

impl Default for ReferralSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            suffix_length: 4,
            suffix_alphabet: BASE36_ALPHABET.to_string(),
        }
    }
}

/// Up to three ASCII letters of `name`, upper-cased.
fn name_part(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(NAME_PART_LEN)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// `REF` followed by the last six digits of the millisecond clock.
pub fn fallback_code() -> String {
    format!("REF{:06}", Utc::now().timestamp_millis().rem_euclid(1_000_000))
}

#[derive(Debug, Clone)]
pub struct ReferralCodeGenerator {
    referrals: Arc<dyn ReferralExt>,
    settings: ReferralSettings,
    alphabet: Vec<char>,
}

impl ReferralCodeGenerator {
    pub fn new(referrals: Arc<dyn ReferralExt>, settings: ReferralSettings) -> Self {
        let mut alphabet: Vec<char> = settings.suffix_alphabet.chars().collect();
        if alphabet.is_empty() {
            alphabet = BASE36_ALPHABET.chars().collect();
        }
        Self {
            referrals,
            settings,
            alphabet,
        }
    }

    pub fn candidate(&self, first_name: &str, last_name: &str) -> String {
        let mut rng = rand::rng();
        let suffix: String = (0..self.settings.suffix_length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect();

        format!("{}{}{}", name_part(first_name), name_part(last_name), suffix)
    }

    /// Never fails: after `max_attempts` collisions (or store errors) it
    /// degrades to [`fallback_code`], which is not checked for uniqueness.
    pub async fn generate_unique_code(&self, first_name: &str, last_name: &str) -> String {
        for attempt in 1..=self.settings.max_attempts {
            let code = self.candidate(first_name, last_name);

            match self.referrals.referral_code_exists(&code).await {
                Ok(false) => return code,
                Ok(true) => {
                    tracing::debug!("referral code {} taken (attempt {})", code, attempt);
                }
                Err(e) => {
                    tracing::warn!("referral code lookup failed on attempt {}: {}", attempt, e);
                }
            }
        }

        let code = fallback_code();
        tracing::warn!(
            "referral code generation exhausted {} attempts, falling back to {}",
            self.settings.max_attempts,
            code
        );
        code
    }
}

#[derive(Debug, Clone)]
pub struct ReferralService {
    users: Arc<dyn UserExt>,
    referrals: Arc<dyn ReferralExt>,
    generator: ReferralCodeGenerator,
}

impl ReferralService {
    pub fn new(
        users: Arc<dyn UserExt>,
        referrals: Arc<dyn ReferralExt>,
        settings: ReferralSettings,
    ) -> Self {
        let generator = ReferralCodeGenerator::new(referrals.clone(), settings);
        Self {
            users,
            referrals,
            generator,
        }
    }

    /// Returns the user's referral, creating one with a fresh code the
    /// first time. The user's `referral_code` always ends up pointing at it.
    pub async fn generate_for_user(&self, user_id: Uuid) -> Result<Referral, ReferralError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(ReferralError::UserNotFound(user_id))?;

        if let Some(existing) = self.referrals.get_referral_by_sponsor(user.id).await? {
            if user.referral_code.as_deref() != Some(existing.referral_code.as_str()) {
                tracing::warn!(
                    "user {} was not linked to referral {}, relinking",
                    user.id,
                    existing.referral_code
                );
                self.users
                    .update_user_referral_code(user.id, existing.referral_code.clone())
                    .await?;
            }
            return Ok(existing);
        }

        let referral_code = self
            .generator
            .generate_unique_code(&user.first_name, &user.last_name)
            .await;

        // Under a concurrent call for the same user this returns whichever
        // referral was stored first.
        let referral = self
            .referrals
            .create_referral(NewReferral {
                referral_code,
                sponsor_id: user.id,
                sponsor_name: user.full_name(),
                sponsor_email: user.email.clone(),
            })
            .await?;

        tracing::info!("referral code {} ready for user {}", referral.referral_code, user.id);
        Ok(referral)
    }

    pub async fn generate_for_email(&self, email: &str) -> Result<Referral, ReferralError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ReferralError::Validation("Email is required".to_string()));
        }

        let user = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| ReferralError::EmailNotFound(email.to_string()))?;

        self.generate_for_user(user.id).await
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Referral, ReferralError> {
        let code = code.trim();
        self.referrals
            .get_referral_by_code(code)
            .await?
            .ok_or_else(|| ReferralError::CodeNotFound(code.to_string()))
    }

    /// Resolves the sponsor behind a code; `None` means the code is unknown.
    pub async fn validate_code(&self, code: &str) -> Result<Option<ReferralSponsor>, ReferralError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ReferralError::Validation("Referral code is required".to_string()));
        }

        let sponsor = self
            .users
            .get_user_by_referral_code(code)
            .await?
            .map(|user| ReferralSponsor {
                id: user.id,
                name: user.full_name(),
                email: user.email,
            });

        Ok(sponsor)
    }

    pub async fn record_usage(&self, code: &str) -> Result<Referral, ReferralError> {
        let code = code.trim();
        self.referrals
            .increment_referral_usage(code)
            .await?
            .ok_or_else(|| ReferralError::CodeNotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use regex::Regex;

    fn service(store: &Arc<MemoryStore>) -> ReferralService {
        ReferralService::new(store.clone(), store.clone(), ReferralSettings::default())
    }

    #[test]
    fn test_name_part_strips_and_truncates() {
        assert_eq!(name_part("Jean"), "JEA");
        assert_eq!(name_part("d'Arc"), "DAR");
        assert_eq!(name_part("Li"), "LI");
        assert_eq!(name_part("Zoë-Ann"), "ZOA");
        assert_eq!(name_part("123"), "");
    }

    #[tokio::test]
    async fn test_codes_for_same_name_are_distinct() {
        let store = Arc::new(MemoryStore::new());
        let generator = ReferralCodeGenerator::new(store.clone(), ReferralSettings::default());
        let pattern = Regex::new(r"^[A-Z]{0,3}[A-Z]{0,3}[A-Z0-9]{4}$").unwrap();

        let first = generator.generate_unique_code("Jean", "Dupont").await;
        let second = generator.generate_unique_code("Jean", "Dupont").await;

        assert!(first.starts_with("JEADUP"));
        assert!(pattern.is_match(&first), "unexpected code {}", first);
        assert!(pattern.is_match(&second), "unexpected code {}", second);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_fall_back_to_timestamp_code() {
        let store = Arc::new(MemoryStore::new());
        store.collide_all_codes();
        let generator = ReferralCodeGenerator::new(store.clone(), ReferralSettings::default());

        let code = generator.generate_unique_code("Jean", "Dupont").await;
        assert!(Regex::new(r"^REF\d{6}$").unwrap().is_match(&code), "unexpected code {}", code);
    }

    #[test]
    fn test_custom_alphabet_and_length() {
        let store = Arc::new(MemoryStore::new());
        let generator = ReferralCodeGenerator::new(
            store,
            ReferralSettings {
                max_attempts: 3,
                suffix_length: 6,
                suffix_alphabet: "XY".to_string(),
            },
        );

        let code = generator.candidate("Al", "Bo");
        assert!(Regex::new(r"^ALBO[XY]{6}$").unwrap().is_match(&code), "unexpected code {}", code);
    }

    #[tokio::test]
    async fn test_generate_for_user_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Jean", "Dupont", "jean@example.com");
        let service = service(&store);

        let referral = service.generate_for_user(user.id).await.unwrap();
        assert_eq!(referral.sponsor_name, "Jean Dupont");
        assert_eq!(referral.usage_count, 0);

        let again = service.generate_for_user(user.id).await.unwrap();
        assert_eq!(again.referral_code, referral.referral_code);

        let sponsor = service
            .validate_code(&format!("  {} ", referral.referral_code))
            .await
            .unwrap()
            .expect("code should resolve to its sponsor");
        assert_eq!(sponsor.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_user_and_code() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        assert!(matches!(
            service.generate_for_user(Uuid::new_v4()).await,
            Err(ReferralError::UserNotFound(_))
        ));
        assert!(service.validate_code("NOPE1234").await.unwrap().is_none());
        assert!(matches!(
            service.validate_code("   ").await,
            Err(ReferralError::Validation(_))
        ));
        assert!(matches!(
            service.record_usage("NOPE1234").await,
            Err(ReferralError::CodeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_usage_increments_count() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Ada", "Lovelace", "ada@example.com");
        let service = service(&store);
        let referral = service.generate_for_user(user.id).await.unwrap();

        service.record_usage(&referral.referral_code).await.unwrap();
        let updated = service.record_usage(&referral.referral_code).await.unwrap();
        assert_eq!(updated.usage_count, 2);

        let fetched = service.get_by_code(&referral.referral_code).await.unwrap();
        assert_eq!(fetched.usage_count, 2);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_nothing_behind() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Jean", "Dupont", "jean@example.com");
        let service = service(&store);

        store.fail_next_referral();
        assert!(matches!(
            service.generate_for_user(user.id).await,
            Err(ReferralError::Database(_))
        ));
        assert_eq!(store.referral_count(), 0);
        assert!(store.user(user.id).unwrap().referral_code.is_none());

        let referral = service.generate_for_user(user.id).await.unwrap();
        let sponsor = service
            .validate_code(&referral.referral_code)
            .await
            .unwrap()
            .expect("retried code should resolve to its sponsor");
        assert_eq!(sponsor.id, user.id);
    }

    #[tokio::test]
    async fn test_unlinked_referral_is_relinked() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Jean", "Dupont", "jean@example.com");
        let now = Utc::now();
        store.insert_referral(Referral {
            id: Uuid::new_v4(),
            referral_code: "JEADUP7K2Q".to_string(),
            sponsor_id: user.id,
            sponsor_name: user.full_name(),
            sponsor_email: user.email.clone(),
            status: crate::models::referralmodel::ReferralStatus::Active,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        });
        let service = service(&store);
        assert!(service.validate_code("JEADUP7K2Q").await.unwrap().is_none());

        let referral = service.generate_for_user(user.id).await.unwrap();
        assert_eq!(referral.referral_code, "JEADUP7K2Q");
        assert_eq!(store.referral_count(), 1);
        assert!(service.validate_code("JEADUP7K2Q").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_codes_held_by_users_count_as_taken() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Jean", "Dupont", "jean@example.com");
        let generator = ReferralCodeGenerator::new(
            store.clone(),
            ReferralSettings {
                max_attempts: 3,
                suffix_length: 1,
                suffix_alphabet: "X".to_string(),
            },
        );
        store
            .update_user_referral_code(user.id, "JEADUPX".to_string())
            .await
            .unwrap();

        let code = generator.generate_unique_code("Jean", "Dupont").await;
        assert!(Regex::new(r"^REF\d{6}$").unwrap().is_match(&code), "unexpected code {}", code);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_generation_creates_one_referral() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Jean", "Dupont", "jean@example.com");
        store.slow_code_checks(20);
        let service = service(&store);

        let (first, second) = tokio::join!(
            service.generate_for_user(user.id),
            service.generate_for_user(user.id)
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.referral_code, second.referral_code);
        assert_eq!(store.referral_count(), 1);
        assert_eq!(
            store.user(user.id).unwrap().referral_code.as_deref(),
            Some(first.referral_code.as_str())
        );
        assert!(service.validate_code(&first.referral_code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_generate_by_email_reuses_user_referral() {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("Grace", "Hopper", "grace@example.com");
        let service = service(&store);

        let by_id = service.generate_for_user(user.id).await.unwrap();
        let by_email = service.generate_for_email(" GRACE@example.com ").await.unwrap();
        assert_eq!(by_id.referral_code, by_email.referral_code);

        assert!(matches!(
            service.generate_for_email("nobody@example.com").await,
            Err(ReferralError::EmailNotFound(_))
        ));
    }
}
