// dtos/referraldtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::referralmodel::{Referral, ReferralSponsor, ReferralStatus};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReferralCodeDto {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReferralCodeDto {
    #[serde(default)]
    pub referral_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralResponseDto {
    pub referral_id: Uuid,
    pub referral_code: String,
    pub sponsor_id: Uuid,
    pub sponsor_name: String,
    pub status: ReferralStatus,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Referral> for ReferralResponseDto {
    fn from(referral: Referral) -> Self {
        Self {
            referral_id: referral.id,
            referral_code: referral.referral_code,
            sponsor_id: referral.sponsor_id,
            sponsor_name: referral.sponsor_name,
            status: referral.status,
            usage_count: referral.usage_count,
            created_at: referral.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralValidationDto {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ReferralSponsor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReferralValidationDto {
    pub fn from_lookup(sponsor: Option<ReferralSponsor>) -> Self {
        match sponsor {
            Some(user) => Self {
                valid: true,
                user: Some(user),
                error: None,
            },
            None => Self {
                valid: false,
                user: None,
                error: Some("Invalid referral code".to_string()),
            },
        }
    }
}
