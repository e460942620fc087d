// config.rs
use crate::service::referral::ReferralSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub referral: ReferralSettings,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("{} has an invalid value {:?}, using the default", key, value);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let defaults = ReferralSettings::default();
        let referral = ReferralSettings {
            max_attempts: env_or("REFERRAL_MAX_ATTEMPTS", defaults.max_attempts),
            suffix_length: env_or("REFERRAL_SUFFIX_LENGTH", defaults.suffix_length),
            suffix_alphabet: std::env::var("REFERRAL_SUFFIX_ALPHABET")
                .ok()
                .filter(|alphabet| !alphabet.is_empty())
                .unwrap_or(defaults.suffix_alphabet),
        };

        Config {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            port: env_or("PORT", 8000),
            allowed_origins,
            referral,
        }
    }
}
