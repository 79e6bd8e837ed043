//! The HTTP front (C11, §6.2): the axum router for the bancho protocol
//! endpoint plus the small set of auxiliary REST-ish status routes this
//! core still owns (the score-submission/ranking surface is out of
//! scope, §1 Non-goals, but "is anyone online" is part of the protocol
//! front itself).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use bytes::BytesMut;
use rand::seq::SliceRandom;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::{self, builders};
use crate::login;
use crate::middleware::ip_address::ClientIp;
use crate::router;
use crate::state::AppState;
use crate::types::UserId;

const OSU_TOKEN_HEADER: &str = "osu-token";
const CHO_TOKEN_HEADER: &str = "cho-token";
const CHO_PROTOCOL_HEADER: &str = "cho-protocol";
const PROTOCOL_VERSION: &str = "19";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(bancho_handler).get(root_page))
        .route("/api/v1/onlineUsers", get(online_users))
        .route("/api/v1/serverStatus", get(server_status))
        .route("/api/status/:user_id", get(user_status))
        .route("/api/v2/status/:user_id", get(user_status))
        .route("/infos", get(infos))
        .layer(Extension(state))
}

/// `POST /` (§6.2, §4.8): the bancho protocol endpoint. Absent `osu-token`
/// means this is the login handshake; present-but-unknown means the
/// client holds a token the registry no longer has (§8 scenario S2);
/// otherwise this is an ordinary packet body for an existing session.
async fn bancho_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> Response {
    let token_header = headers.get(OSU_TOKEN_HEADER).and_then(|value| value.to_str().ok());

    let (token, out_body) = match token_header {
        None => {
            let result = login::login(&state, &body, ip).await;
            (result.token, result.body)
        }
        Some(token_str) => {
            let session = Uuid::parse_str(token_str).ok().and_then(|id| state.sessions.by_id(&id));
            let Some(session) = session else {
                return unknown_token_response();
            };

            let _processing = session.processing.lock().await;
            session.touch();

            match codec::split_frames(&body) {
                Ok(frames) => router::dispatch_frames(&state, &session, frames).await,
                Err(err) => {
                    // §4.1 Failure: fatal for this request, not the session.
                    log::warn!("malformed packet body from {}: {err}", session.username);
                    session.enqueue(builders::unknown_token_restart());
                    session.enqueue(builders::notification(
                        "The server could not read your last request. Please reconnect.",
                    ));
                }
            }

            let out = session.fetch_queue();

            // §4.2/§4.8: a session another thread marked `kicked` (admin
            // kick, ban bridge event) mid-request is torn down only once
            // this response has drained its queue.
            if session.is_kicked() && state.sessions.by_id(&session.id).is_some() {
                router::force_logout(&state, &session);
            }

            (Some(session.id), out)
        }
    };

    bancho_response(token, out_body)
}

fn unknown_token_response() -> Response {
    let mut body = BytesMut::new();
    body.extend_from_slice(&builders::unknown_token_restart());
    body.extend_from_slice(&builders::notification("Server has restarted, please log in again."));
    bancho_response(None, body.freeze())
}

fn bancho_response(token: Option<Uuid>, body: Bytes) -> Response {
    let token = token.map(|id| id.to_string()).unwrap_or_default();
    Response::builder()
        .status(StatusCode::OK)
        .header(CHO_TOKEN_HEADER, token)
        .header(CHO_PROTOCOL_HEADER, PROTOCOL_VERSION)
        .header(header::CONNECTION, "keep-alive")
        .header("Keep-Alive", "timeout=5, max=100")
        .header(header::CONTENT_TYPE, "text/html; charset=UTF-8")
        .body(Body::from(body))
        .expect("a response built from well-formed ASCII header values never fails")
}

/// `GET /` (§6.2): not protocol-relevant, just a landing page so hitting
/// the bancho port in a browser shows something other than a blank body.
async fn root_page(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html><head><title>{name}</title></head><body><h1>{name}</h1><p>{online} user(s) online.</p></body></html>",
        name = state.config.branding.name,
        online = state.sessions.len(),
    ))
}

#[derive(Serialize)]
struct ApiEnvelope<T: Serialize> {
    status: i32,
    message: &'static str,
    result: T,
}

fn ok<T: Serialize>(result: T) -> Json<ApiEnvelope<T>> {
    Json(ApiEnvelope { status: 200, message: "ok", result })
}

/// `GET /api/v1/onlineUsers` (§6.2).
async fn online_users(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    ok(state.sessions.len())
}

/// `GET /api/v1/serverStatus` (§6.2): `-1` while a scheduled restart is
/// counting down, `1` otherwise.
async fn server_status(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let result = if state.restarting.load(Ordering::Acquire) { -1 } else { 1 };
    ok(result)
}

#[derive(Serialize)]
struct UserStatusResponse {
    user_id: UserId,
    username: String,
    action_id: u8,
    action_text: String,
    beatmap_id: i32,
    mods: i32,
    game_mode: u8,
    ranked_score: i64,
    accuracy: f32,
    playcount: i32,
    pp: i16,
    global_rank: i32,
}

/// `GET /api/status/{user-id}` and `GET /api/v2/status/{user-id}` (§6.2):
/// session-derived JSON, or 404 when the user isn't currently online —
/// this core holds no offline user state to answer from (§1 Non-goals).
async fn user_status(Extension(state): Extension<Arc<AppState>>, Path(user_id): Path<UserId>) -> Response {
    let Some(session) = state.sessions.by_user_id(user_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let action = session.action.lock();
    let stats = session.stats.lock();
    ok(UserStatusResponse {
        user_id: session.user_id,
        username: session.username.clone(),
        action_id: action.action_id,
        action_text: action.action_text.clone(),
        beatmap_id: action.beatmap_id,
        mods: action.mods,
        game_mode: action.game_mode,
        ranked_score: stats.ranked_score,
        accuracy: stats.accuracy,
        playcount: stats.playcount,
        pp: stats.pp,
        global_rank: stats.global_rank,
    })
    .into_response()
}

const MOTD_QUOTES: &[&str] = &[
    "where we're going, we don't need roads.",
    "excellence is not an act, but a habit.",
    "the only way out is through.",
    "good things come to those who grind.",
];

#[derive(Serialize)]
struct InfosResponse {
    name: String,
    motd: String,
    online_users: usize,
    icon_url: String,
    bot_id: UserId,
}

/// `GET /infos` (§6.2): small branding blob the web front end polls for
/// its landing page.
async fn infos(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let motd = MOTD_QUOTES.choose(&mut rand::thread_rng()).copied().unwrap_or_default().to_owned();
    Json(InfosResponse {
        name: state.config.branding.name.clone(),
        motd,
        online_users: state.sessions.len(),
        icon_url: format!("https://{}/static/icon.png", state.config.branding.domain),
        bot_id: state.config.branding.bot_user_id,
    })
}
