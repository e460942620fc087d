// db/referraldb.rs
use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::referralmodel::{NewReferral, Referral};

#[async_trait]
pub trait ReferralExt: Send + Sync {
    async fn referral_code_exists(&self, referral_code: &str) -> Result<bool, sqlx::Error>;

    async fn get_referral_by_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error>;

    async fn get_referral_by_sponsor(
        &self,
        sponsor_id: Uuid,
    ) -> Result<Option<Referral>, sqlx::Error>;

    /// Inserts the sponsor's referral and writes its code onto the user in
    /// one unit. A sponsor holds at most one referral: if one already exists
    /// it is returned (and re-linked to the user) instead of inserting.
    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, sqlx::Error>;

    /// Bumps `usage_count` on an active referral; `None` if no active
    /// referral carries the code.
    async fn increment_referral_usage(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error>;
}

impl std::fmt::Debug for dyn ReferralExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReferralExt")
    }
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn referral_code_exists(&self, referral_code: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM referrals WHERE referral_code = $1)
                OR EXISTS(SELECT 1 FROM users WHERE referral_code = $1) AS taken
            "#
        )
        .bind(referral_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<bool, _>("taken"))
    }

    async fn get_referral_by_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            r#"
            SELECT
                id, referral_code, sponsor_id, sponsor_name, sponsor_email,
                status, usage_count, created_at, updated_at
            FROM referrals
            WHERE referral_code = $1
            "#
        )
        .bind(referral_code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_referral_by_sponsor(
        &self,
        sponsor_id: Uuid,
    ) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            r#"
            SELECT
                id, referral_code, sponsor_id, sponsor_name, sponsor_email,
                status, usage_count, created_at, updated_at
            FROM referrals
            WHERE sponsor_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(sponsor_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // A concurrent insert for the same sponsor blocks here until it commits.
        let inserted = sqlx::query_as::<_, Referral>(
            r#"
            INSERT INTO referrals
            (referral_code, sponsor_id, sponsor_name, sponsor_email, status, usage_count)
            VALUES ($1, $2, $3, $4, 'active'::referral_status, 0)
            ON CONFLICT (sponsor_id) DO NOTHING
            RETURNING
                id, referral_code, sponsor_id, sponsor_name, sponsor_email,
                status, usage_count, created_at, updated_at
            "#
        )
        .bind(&referral.referral_code)
        .bind(referral.sponsor_id)
        .bind(&referral.sponsor_name)
        .bind(&referral.sponsor_email)
        .fetch_optional(&mut *tx)
        .await?;

        let referral = match inserted {
            Some(created) => created,
            None => {
                sqlx::query_as::<_, Referral>(
                    r#"
                    SELECT
                        id, referral_code, sponsor_id, sponsor_name, sponsor_email,
                        status, usage_count, created_at, updated_at
                    FROM referrals
                    WHERE sponsor_id = $1
                    "#
                )
                .bind(referral.sponsor_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let linked = sqlx::query(
            r#"
            UPDATE users
            SET referral_code = $2, updated_at = NOW()
            WHERE id = $1
            "#
        )
        .bind(referral.sponsor_id)
        .bind(&referral.referral_code)
        .execute(&mut *tx)
        .await?;

        if linked.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;

        Ok(referral)
    }

    async fn increment_referral_usage(
        &self,
        referral_code: &str,
    ) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            r#"
            UPDATE referrals
            SET usage_count = usage_count + 1, updated_at = NOW()
            WHERE referral_code = $1 AND status = 'active'::referral_status
            RETURNING
                id, referral_code, sponsor_id, sponsor_name, sponsor_email,
                status, usage_count, created_at, updated_at
            "#
        )
        .bind(referral_code)
        .fetch_optional(&self.pool)
        .await
    }
}
