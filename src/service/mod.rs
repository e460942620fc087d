pub mod error;
pub mod gift_card_service;
pub mod referral;
