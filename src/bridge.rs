//! The pub/sub bridge (C9, §4.9): a long-running subscriber on the
//! external cache bus that lets collaborator services reach into live
//! sessions — bans, silences, stat refreshes, privilege changes, and
//! plain notifications — without ever touching the session registry
//! themselves. Everything here is deliberately tolerant: an unknown
//! channel or a payload that doesn't parse is logged and dropped rather
//! than taking the bridge connection down (§4.9 "Unknown channels or
//! malformed payloads are dropped with a warning").

use std::sync::Arc;

use serde::Deserialize;

use crate::chat;
use crate::codec::builders;
use crate::collaborators::CacheBus;
use crate::login;
use crate::router;
use crate::state::AppState;
use crate::types::UserId;

#[derive(Deserialize)]
struct UserIdPayload {
    user_id: UserId,
}

#[derive(Deserialize)]
struct SilencePayload {
    user_id: UserId,
    seconds: u32,
}

#[derive(Deserialize)]
struct NotificationPayload {
    user_id: Option<UserId>,
    message: String,
}

#[derive(Deserialize)]
struct RefreshPrivsPayload {
    user_id: UserId,
    privileges: i32,
}

#[derive(Deserialize)]
struct BotMsgPayload {
    /// A channel name (`#osu`) or a username, matching the `Bot` trait's
    /// own `channel_or_user` convention (§6.4).
    target: String,
    message: String,
}

/// Runs the bridge until the underlying connection drops (§4.9). Meant to
/// be `tokio::spawn`ed once at startup; a dropped connection just ends
/// the task rather than panicking the process, since losing the bridge
/// degrades external control of live sessions, not the protocol core.
pub async fn run(state: Arc<AppState>, bus: Arc<CacheBus>) {
    let result = bus
        .subscribe(move |channel, payload| {
            let state = state.clone();
            async move { handle_message(&state, &channel, &payload).await }
        })
        .await;

    if let Err(err) = result {
        log::warn!("pub/sub bridge connection ended: {err}");
    }
}

async fn handle_message(state: &Arc<AppState>, channel: &str, payload: &str) {
    let outcome = match channel {
        "disconnect" => handle_disconnect(state, payload),
        "ban" => handle_ban(state, payload),
        "silence" => handle_silence(state, payload),
        "notification" => handle_notification(state, payload),
        "refresh_privs" => handle_refresh_privs(state, payload),
        "update_cached_stats" => handle_update_cached_stats(state, payload).await,
        "reload_settings" => handle_reload_settings(state).await,
        "bot_msg" => handle_bot_msg(state, payload),
        _ => {
            log::warn!("pub/sub bridge received an unrecognized channel: {channel}");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        log::warn!("pub/sub bridge dropped a malformed payload on {channel}: {err}");
    }
}

fn handle_disconnect(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: UserIdPayload = serde_json::from_str(payload)?;
    if let Some(session) = state.sessions.by_user_id(data.user_id) {
        router::force_logout(state, &session);
    }
    Ok(())
}

/// A ban is a disconnect with a reason: the session is told why before
/// the same teardown `disconnect` uses runs. As with any external kick,
/// the notification only reaches the client if it polls again before the
/// token is gone; a client that's already gone silent gets nothing extra.
fn handle_ban(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: UserIdPayload = serde_json::from_str(payload)?;
    if let Some(session) = state.sessions.by_user_id(data.user_id) {
        session.enqueue(builders::notification("Your account has been banned."));
        router::force_logout(state, &session);
    }
    Ok(())
}

fn handle_silence(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: SilencePayload = serde_json::from_str(payload)?;
    if let Some(session) = state.sessions.by_user_id(data.user_id) {
        chat::silence_session(&session, data.seconds);
    }
    Ok(())
}

/// A notification names a user, or broadcasts to every live session when
/// it doesn't (an operator-wide announcement).
fn handle_notification(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: NotificationPayload = serde_json::from_str(payload)?;
    let packet = builders::notification(&data.message);
    match data.user_id {
        Some(user_id) => {
            if let Some(session) = state.sessions.by_user_id(user_id) {
                session.enqueue(packet);
            }
        }
        None => {
            for session in state.sessions.all() {
                session.enqueue(packet.clone());
            }
        }
    }
    Ok(())
}

fn handle_refresh_privs(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: RefreshPrivsPayload = serde_json::from_str(payload)?;
    if let Some(session) = state.sessions.by_user_id(data.user_id) {
        session.set_privileges(data.privileges);
    }
    Ok(())
}

/// Re-fetches ranked stats and rank from the relational store/cache and
/// re-broadcasts the session's stats packet, the way a `requestStatusUpdate`
/// would, but triggered by an external score-submission service instead of
/// the client itself (§4.9).
async fn handle_update_cached_stats(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: UserIdPayload = serde_json::from_str(payload)?;
    let Some(session) = state.sessions.by_user_id(data.user_id) else {
        return Ok(());
    };

    let safe = login::safe_username(&session.username);
    let mut stats = login::fetch_stats(state, data.user_id).await;
    stats.global_rank = login::global_rank(state, &safe).await;
    *session.stats.lock() = stats;

    crate::presence::broadcast_stats(state, &session);
    Ok(())
}

async fn handle_reload_settings(state: &AppState) -> serde_json::Result<()> {
    if let Err(err) = state.channels.reload(state.collaborators.db.as_ref()).await {
        log::warn!("reload_settings could not refresh channels: {err}");
    }
    Ok(())
}

/// Posts a message as the configured bot identity, either to a channel
/// stream or as a private message to a single online user.
fn handle_bot_msg(state: &AppState, payload: &str) -> serde_json::Result<()> {
    let data: BotMsgPayload = serde_json::from_str(payload)?;
    let bot_name = &state.config.branding.bot_username;
    let bot_id = state.config.branding.bot_user_id;

    if let Some(channel) = state.channels.get(&data.target) {
        let packet = builders::send_message(bot_name, bot_id, &data.message, &data.target);
        state.streams.broadcast(&state.sessions, &channel.stream_name(), packet, None);
        return Ok(());
    }

    if let Some(target) = state.sessions.by_username(&data.target) {
        let packet = builders::send_message(bot_name, bot_id, &data.message, &target.username);
        target.enqueue(packet);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::test_support::bare_state;

    fn make_session(state: &AppState, user_id: i32) -> Arc<crate::session::Session> {
        let session = Arc::new(crate::session::Session::new(
            crate::types::SessionId::new_v4(),
            user_id,
            format!("user{user_id}"),
            3,
            0,
            0,
            0.0,
            0.0,
            false,
            crate::session::StatsState::default(),
            false,
            false,
            0,
        ));
        state.sessions.insert(session.clone());
        session
    }

    #[test]
    fn disconnect_removes_the_targeted_session() {
        let state = bare_state();
        let session = make_session(&state, 7);
        handle_disconnect(&state, r#"{"user_id":7}"#).unwrap();
        assert!(state.sessions.by_id(&session.id).is_none());
    }

    #[test]
    fn disconnect_for_an_offline_user_is_a_silent_no_op() {
        let state = bare_state();
        assert!(handle_disconnect(&state, r#"{"user_id":999}"#).is_ok());
    }

    #[test]
    fn silence_applies_the_requested_duration() {
        let state = bare_state();
        let session = make_session(&state, 8);
        handle_silence(&state, r#"{"user_id":8,"seconds":30}"#).unwrap();
        assert!(session.is_silenced(chrono::Utc::now().timestamp()));
    }

    #[test]
    fn refresh_privs_updates_the_restricted_flag() {
        let state = bare_state();
        let session = make_session(&state, 9);
        assert!(!session.is_restricted());
        // NORMAL without PUBLIC: restricted (see privileges.rs).
        handle_refresh_privs(&state, r#"{"user_id":9,"privileges":2}"#).unwrap();
        assert!(session.is_restricted());
    }

    #[test]
    fn malformed_payload_is_reported_as_an_error_not_a_panic() {
        let state = bare_state();
        assert!(handle_disconnect(&state, "not json").is_err());
    }
}
