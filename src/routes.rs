// routes.rs
use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{gift_cards::gift_card_handler, referrals::referral_handler},
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/gift-cards", gift_card_handler())
        .nest("/referrals", referral_handler());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
