mod models;
mod service;
mod config;
mod dtos;
mod error;
mod db;
mod utils;
mod handler;
mod routes;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{giftcarddb::GiftCardExt, referraldb::ReferralExt, userdb::UserExt, DBClient};
use dotenv::dotenv;
use routes::create_router;
use service::{
    gift_card_service::{GiftCardService, GiftCardTransactionService},
    referral::ReferralService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub gift_card_service: Arc<GiftCardService>,
    pub gift_card_transaction_service: Arc<GiftCardTransactionService>,
    pub referral_service: Arc<ReferralService>,
}

impl AppState {
    pub fn new(
        env: Config,
        gift_cards: Arc<dyn GiftCardExt>,
        users: Arc<dyn UserExt>,
        referrals: Arc<dyn ReferralExt>,
    ) -> Self {
        let referral_service = ReferralService::new(users, referrals, env.referral.clone());
        Self {
            gift_card_service: Arc::new(GiftCardService::new(gift_cards.clone())),
            gift_card_transaction_service: Arc::new(GiftCardTransactionService::new(gift_cards)),
            referral_service: Arc::new(referral_service),
            env,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let db_client = Arc::new(DBClient::new(pool));
    let app_state = AppState::new(
        config.clone(),
        db_client.clone(),
        db_client.clone(),
        db_client,
    );

    let app = create_router(Arc::new(app_state)).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", err);
        std::process::exit(1);
    }
}
