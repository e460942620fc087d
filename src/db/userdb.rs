// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::User;

#[async_trait]
pub trait UserExt: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn update_user_referral_code(
        &self,
        user_id: Uuid,
        referral_code: String,
    ) -> Result<User, sqlx::Error>;
}

impl std::fmt::Debug for dyn UserExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UserExt")
    }
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, referral_code, created_at, updated_at
            FROM users
            WHERE id = $1
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, referral_code, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, referral_code, created_at, updated_at
            FROM users
            WHERE referral_code = $1
            "#
        )
        .bind(referral_code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_user_referral_code(
        &self,
        user_id: Uuid,
        referral_code: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET referral_code = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, referral_code, created_at, updated_at
            "#
        )
        .bind(user_id)
        .bind(referral_code)
        .fetch_one(&self.pool)
        .await
    }
}
