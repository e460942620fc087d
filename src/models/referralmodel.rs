use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "referral_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Referral {
    pub id: Uuid,
    pub referral_code: String,
    pub sponsor_id: Uuid,
    pub sponsor_name: String,
    pub sponsor_email: String,
    pub status: ReferralStatus,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referral_code: String,
    pub sponsor_id: Uuid,
    pub sponsor_name: String,
    pub sponsor_email: String,
}

/// Public view of the user behind a referral code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferralSponsor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
