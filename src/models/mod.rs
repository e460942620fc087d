pub mod giftcardmodels;
pub mod referralmodel;
pub mod usermodel;
