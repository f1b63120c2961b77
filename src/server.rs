use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::actions;
use crate::board::{Notice, Slot};
use crate::connector::WalletOptions;
use crate::display;
use crate::error::ActionError;
use crate::state::AppState;
use crate::types::{ConnectionKind, ConnectionState, WalletSession};
use crate::web;

type S = Arc<AppState>;
type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Asset directories under `STATIC_DIR` served as-is. Nothing else in that
/// directory is reachable, so `.env` and the session file stay private.
const ASSET_DIRS: [&str; 3] = ["styles", "scripts", "images"];

pub fn build_router(state: S) -> Router {
    let mut router: Router<S> = Router::new()
        .route("/", get(serve_index))
        .route("/docs", get(serve_docs))
        .route("/dashboard", get(serve_dashboard))
        .route("/health", get(get_health))
        .route("/api/stats", get(get_stats))
        .route("/api/contributions", get(get_contributions))
        .route("/api/live", get(get_live))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/{id}/dismiss", post(post_dismiss))
        .route("/api/wallet", get(get_wallet))
        .route("/api/wallet/options", get(get_wallet_options))
        .route("/api/wallet/connect", post(post_connect))
        .route("/api/wallet/disconnect", post(post_disconnect))
        .route("/api/contribute", post(post_contribute))
        .route("/api/claim", post(post_claim))
        .route("/api/estimate", post(post_estimate));
    for dir in ASSET_DIRS {
        router = router.nest_service(&format!("/{dir}"), ServeDir::new(state.config.static_dir.join(dir)));
    }
    router.layer(CorsLayer::permissive()).with_state(state)
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Pages ───────────────────────────────────────────────────────────────────

async fn read_page(dir: &Path, name: &str) -> Option<String> {
    match tokio::fs::read_to_string(dir.join(name)).await {
        Ok(html) => Some(html),
        Err(e) => {
            tracing::debug!(page = name, error = %e, "page not found in static dir");
            None
        }
    }
}

async fn serve_page(state: &AppState, name: &str) -> Result<Html<String>, (StatusCode, String)> {
    read_page(&state.config.static_dir, name)
        .await
        .map(Html)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("{name} not found")))
}

pub(crate) async fn serve_index(State(state): State<S>) -> Result<Html<String>, (StatusCode, String)> {
    serve_page(&state, "index.html").await
}

pub(crate) async fn serve_docs(State(state): State<S>) -> Result<Html<String>, (StatusCode, String)> {
    serve_page(&state, "docs.html").await
}

pub(crate) async fn serve_dashboard(State(state): State<S>) -> Html<String> {
    match read_page(&state.config.static_dir, "dashboard.html").await {
        Some(html) => Html(html),
        None => Html(web::DASHBOARD_HTML.to_string()),
    }
}

// ── Placeholder API ─────────────────────────────────────────────────────────

pub(crate) async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK", "timestamp": now_iso() }))
}

pub(crate) async fn get_stats() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "totalReports": 1254,
        "totalRevenue": 42.5,
        "activeUsers": 892,
        "satisfaction": 94,
        "presaleRaised": 2.45,
        "presaleGoal": 10,
        "contributors": 3247,
        "timestamp": now_iso(),
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct SampleContribution {
    pub address: &'static str,
    pub amount: u64,
    pub timestamp: String,
}

pub(crate) async fn get_contributions() -> Json<Vec<SampleContribution>> {
    let now = Utc::now();
    let at = |minutes_ago: i64| {
        (now - Duration::minutes(minutes_ago)).to_rfc3339_opts(SecondsFormat::Millis, true)
    };
    Json(vec![
        SampleContribution { address: "0x8f7d...4c2a", amount: 12500, timestamp: at(0) },
        SampleContribution { address: "0x3b2a...9e1f", amount: 5200, timestamp: at(15) },
        SampleContribution { address: "0x6d91...7b34", amount: 23100, timestamp: at(60) },
    ])
}

// ── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct LiveResponse {
    pub network: String,
    pub chain_name: String,
    pub chain_id: u64,
    pub symbol: String,
    pub connected: bool,
    pub slots: BTreeMap<&'static str, Slot>,
}

pub(crate) async fn get_live(State(state): State<S>) -> Json<LiveResponse> {
    let network = &state.config.network;
    Json(LiveResponse {
        network: network.name.clone(),
        chain_name: network.chain_name.clone(),
        chain_id: network.chain_id,
        symbol: network.symbol().to_string(),
        connected: state.connector.is_connected(),
        slots: state.board.snapshot(),
    })
}

pub(crate) async fn get_notifications(State(state): State<S>) -> Json<Vec<Notice>> {
    Json(state.notices.active(Utc::now()))
}

pub(crate) async fn post_dismiss(State(state): State<S>, UrlPath(id): UrlPath<u64>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "dismissed": state.notices.dismiss(id) }))
}

#[derive(Serialize)]
pub(crate) struct WalletResponse {
    pub state: ConnectionState,
    pub session: Option<WalletSession>,
}

pub(crate) async fn get_wallet(State(state): State<S>) -> Json<WalletResponse> {
    Json(WalletResponse {
        state: state.connector.state(),
        session: state.connector.session(),
    })
}

pub(crate) async fn get_wallet_options(State(state): State<S>) -> Json<WalletOptions> {
    Json(state.connector.options())
}

#[derive(Deserialize)]
pub(crate) struct ConnectRequest {
    pub kind: String,
}

pub(crate) async fn post_connect(
    State(state): State<S>,
    Json(body): Json<ConnectRequest>,
) -> ApiResult<WalletSession> {
    let kind = ConnectionKind::parse(&body.kind)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown wallet kind: {}", body.kind)))?;

    let session = state
        .connector
        .connect(kind)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    let app = state.clone();
    tokio::spawn(async move {
        crate::refresher::refresh_user(&app).await;
    });
    Ok(Json(session))
}

pub(crate) async fn post_disconnect(State(state): State<S>) -> Json<serde_json::Value> {
    state.connector.disconnect().await;
    Json(serde_json::json!({"ok": true}))
}

/// Amounts arrive as whatever the input box held: a JSON number or a string.
/// Anything unparseable becomes zero, which the validation then rejects.
#[derive(Deserialize)]
pub(crate) struct AmountRequest {
    #[serde(default)]
    pub amount: serde_json::Value,
}

pub(crate) fn parse_amount(raw: &serde_json::Value) -> Decimal {
    let text = match raw {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Decimal::ZERO,
    };
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or(Decimal::ZERO)
}

fn action_status(err: &ActionError) -> (StatusCode, String) {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, err.to_string())
}

pub(crate) async fn post_contribute(
    State(state): State<S>,
    Json(body): Json<AmountRequest>,
) -> ApiResult<serde_json::Value> {
    let amount = parse_amount(&body.amount);
    let hash = actions::contribute(&state, amount)
        .await
        .map_err(|e| action_status(&e))?;
    Ok(Json(serde_json::json!({ "ok": true, "tx": format!("{hash:#x}") })))
}

pub(crate) async fn post_claim(State(state): State<S>) -> ApiResult<serde_json::Value> {
    let hash = actions::claim_tokens(&state)
        .await
        .map_err(|e| action_status(&e))?;
    Ok(Json(serde_json::json!({ "ok": true, "tx": format!("{hash:#x}") })))
}

pub(crate) async fn post_estimate(
    State(state): State<S>,
    Json(body): Json<AmountRequest>,
) -> Json<serde_json::Value> {
    let amount = parse_amount(&body.amount);
    let tokens = actions::estimate_tokens(&state, amount);
    let price = state.config.network.estimate_price(&state.snapshot_or_default());
    let update = display::token_estimate(amount, price);
    state.board.apply(vec![update.clone()]);
    Json(serde_json::json!({
        "amount": amount.to_string(),
        "tokens": tokens.floor().to_string(),
        "display": update.1.text,
    }))
}
