pub mod room_name;

use crate::config::AppConfig;
use crate::game::constants::MAX_LISTED_ROOMS;
use crate::game::registry::RoomRegistry;
use crate::game::types::{RoomSettings, Visibility};
use crate::rate_limit::RateLimiter;
use crate::transport::ws_session::handle_socket;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Query, State, WebSocketUpgrade},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use room_name::validate_room_name;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub create_limiter: RateLimiter,
    pub list_limiter: RateLimiter,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(config.tick_interval())),
            create_limiter: RateLimiter::new(config.create_room_burst, config.create_room_window),
            list_limiter: RateLimiter::new(config.list_rooms_burst, config.list_rooms_window),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    name: String,
    public: bool,
    #[serde(default)]
    settings: Option<RoomSettings>,
}

#[derive(Debug, Serialize)]
struct CreateRoomResponse {
    success: bool,
    #[serde(rename = "roomId")]
    room_id: String,
    #[serde(rename = "redirectUrl")]
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct ListRoomsQuery {
    limit: Option<usize>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/:room", get(room_status))
        .route("/api/rooms/:room/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// The peer address, or the first `x-forwarded-for` hop when running behind
/// a trusted proxy.
fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}

/// Game page for a room. The page is served by the static front end, not by
/// this router.
fn room_page_url(room_id: &str) -> String {
    format!("/rooms/{room_id}")
}

async fn health() -> impl IntoResponse {
    Json(OkResponse { ok: true })
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Response {
    let ip = client_ip(&headers, peer, state.config.trust_proxy);
    if !state.create_limiter.try_acquire(ip).await {
        tracing::warn!(%ip, "room creation rate limited");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many rooms created from this device, please try again later.",
        );
    }

    let Ok(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed");
    };
    let Some(name) = validate_room_name(&payload.name) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid room name");
    };

    let room_id = state.registry.create_room(
        name,
        Visibility::from_public_flag(payload.public),
        payload.settings.unwrap_or_default(),
    );
    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            success: true,
            redirect_url: room_page_url(&room_id),
            room_id,
        }),
    )
        .into_response()
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ListRoomsQuery>,
) -> Response {
    let ip = client_ip(&headers, peer, state.config.trust_proxy);
    if !state.list_limiter.try_acquire(ip).await {
        tracing::warn!(%ip, "room listing rate limited");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later.",
        );
    }

    let limit = query.limit.unwrap_or(MAX_LISTED_ROOMS);
    Json(state.registry.list_public_rooms(limit)).into_response()
}

async fn room_status(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Response {
    if state.registry.room_exists(room.trim()) {
        Json(OkResponse { ok: true }).into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "Unknown room")
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let room_id = room.trim().to_string();
    if !state.registry.room_exists(&room_id) {
        return error_response(StatusCode::NOT_FOUND, "Unknown room");
    }
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| handle_socket(socket, registry, room_id))
        .into_response()
}

/// Sweeps idle rooms and quiet rate-limit buckets until the process exits.
pub async fn maintenance_loop(state: Arc<AppState>) {
    let period = state.config.maintenance_interval;
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let removed = state
            .registry
            .sweep_idle(state.config.room_idle_timeout)
            .await;
        let create_tracked = state
            .create_limiter
            .cleanup(state.config.create_room_window)
            .await;
        let list_tracked = state
            .list_limiter
            .cleanup(state.config.list_rooms_window)
            .await;
        tracing::debug!(
            removed,
            rooms = state.registry.len(),
            create_tracked,
            list_tracked,
            "maintenance pass"
        );
    }
}
