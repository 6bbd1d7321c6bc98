use alloy::primitives::Address;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::QuoteService;

pub struct AppState {
    pub service: Arc<QuoteService>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    amount: Option<String>,
}

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "error": error })),
    )
        .into_response()
}

/// `0x` followed by exactly 40 hex characters, any case.
pub fn parse_token_address(raw: &str) -> Option<Address> {
    let hex = raw.strip_prefix("0x")?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    raw.parse().ok()
}

pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    match raw {
        None => Some(1.0),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0),
    }
}

/// GET /api/token/:address?amount=
async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Response {
    let Some(token) = parse_token_address(&address) else {
        return bad_request("Invalid token address");
    };
    let Some(amount) = parse_amount(params.amount.as_deref()) else {
        return bad_request("Invalid amount");
    };

    Json(state.service.get_token_with_quote(token, amount).await).into_response()
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Token Price API",
        "endpoints": [
            {
                "path": "/api/token/:address",
                "method": "GET",
                "description": "Get token info with price from 0.01% pool"
            },
            {
                "path": "/health",
                "method": "GET",
                "description": "Health check endpoint"
            }
        ]
    }))
}

pub fn create_rest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/token/:address", get(get_token))
        .route("/health", get(health))
        .with_state(state)
}
