use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::Address;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{
    auth::{AdminIdentity, Authorizer, Decision},
    store::{PriceEntry, PriceError, PriceRepository},
};

pub const ADMIN_TOKEN_HEADER: &str = "admin-token";
pub const WALLET_HEADER: &str = "x-wallet-address";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PriceRepository>,
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    pub fn new(store: Arc<dyn PriceRepository>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer }
    }

    fn _require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let identity = identity_from(headers);
        match self.authorizer.authorize(&identity) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(reason, wallet = ?identity.wallet, "admin request denied");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Price(PriceError),
}

impl From<PriceError> for ApiError {
    fn from(e: PriceError) -> Self {
        ApiError::Price(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Price(e @ PriceError::UnknownSymbol(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Price(e @ PriceError::InvalidValue) => (StatusCode::BAD_REQUEST, e.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/crypto-values", get(list_prices))
        .route("/api/admin/crypto-values", get(list_prices_admin))
        .route("/api/admin/crypto-values/:symbol", put(update_price))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Extracts the admin token and the optional wallet from request headers.
pub fn identity_from(headers: &HeaderMap) -> AdminIdentity {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    };
    AdminIdentity {
        token: text(ADMIN_TOKEN_HEADER),
        wallet: text(WALLET_HEADER).and_then(|w| w.parse::<Address>().ok()),
    }
}

async fn list_prices(State(state): State<AppState>) -> Json<BTreeMap<String, PriceEntry>> {
    Json(state.store.all())
}

async fn list_prices_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, PriceEntry>>, ApiError> {
    state._require_admin(&headers)?;
    Ok(Json(state.store.all()))
}

async fn update_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PriceEntry>, ApiError> {
    state._require_admin(&headers)?;

    if state.store.get(&symbol).is_none() {
        return Err(PriceError::UnknownSymbol(symbol).into());
    }
    // anything other than a JSON number is rejected like a non-positive value
    let value = body
        .ok()
        .and_then(|Json(v)| v.get("value").and_then(Value::as_f64))
        .ok_or(PriceError::InvalidValue)?;

    let entry = state.store.update(&symbol, value, Utc::now())?;
    info!(%symbol, value, "price updated");
    Ok(Json(entry))
}
