pub mod db;
pub mod giftcarddb;
pub mod referraldb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

pub use db::DBClient;
