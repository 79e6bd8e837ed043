//! Builds the presence/stats packets for a live session and fans out
//! updates to the `main` stream (§3 Glossary "Stream", §4.3 naming
//! conventions: "`main` (every live non-restricted session)").

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::builders::{self, UserStats};
use crate::session::Session;
use crate::state::AppState;

pub const MAIN_STREAM: &str = "main";

pub fn presence_packet(session: &Session) -> Bytes {
    let stats = session.stats.lock();
    builders::user_presence(
        session.user_id,
        &session.username,
        session.utc_offset,
        session.country,
        rank_colour(stats.global_rank),
        session.longitude,
        session.latitude,
        stats.global_rank,
    )
}

pub fn stats_packet(session: &Session) -> Bytes {
    let action = session.action.lock();
    let stats = session.stats.lock();
    builders::user_stats(&UserStats {
        user_id: session.user_id,
        action_id: action.action_id,
        action_text: action.action_text.clone(),
        action_md5: action.beatmap_md5.clone(),
        action_mods: action.mods,
        game_mode: action.game_mode,
        beatmap_id: action.beatmap_id,
        ranked_score: stats.ranked_score,
        accuracy: stats.accuracy,
        playcount: stats.playcount,
        total_score: stats.total_score,
        global_rank: stats.global_rank,
        pp: stats.pp,
    })
}

/// Rank-colour banding the upstream client paints leaderboard rows with;
/// arbitrary thresholds, cosmetic only.
fn rank_colour(global_rank: i32) -> u8 {
    match global_rank {
        1 => 1,
        2..=10 => 2,
        11..=100 => 3,
        _ => 0,
    }
}

/// Adds a freshly logged-in, non-restricted session to `main` and tells
/// every existing member about it (§4.3 naming conventions).
pub fn announce_presence(state: &AppState, session: &Arc<Session>) {
    if session.is_restricted() {
        return;
    }
    state.streams.join(MAIN_STREAM, session.id);
    let presence = presence_packet(session);
    let stats = stats_packet(session);
    state.streams.broadcast(&state.sessions, MAIN_STREAM, presence, None);
    state.streams.broadcast(&state.sessions, MAIN_STREAM, stats, None);
}

/// Re-broadcasts a session's current stats to `main` (action changes,
/// `requestStatusUpdate`, post-match score updates).
pub fn broadcast_stats(state: &AppState, session: &Session) {
    if session.is_restricted() {
        return;
    }
    let packet = stats_packet(session);
    state.streams.broadcast(&state.sessions, MAIN_STREAM, packet, None);
}

/// Removes a session from `main` and tells the remaining members it left
/// (§3 lifecycle: destroyed on logout/timeout/kick).
pub fn announce_logout(state: &AppState, session: &Session) {
    state.streams.leave(MAIN_STREAM, session.id);
    let packet = builders::user_logout(session.user_id);
    state.streams.broadcast(&state.sessions, MAIN_STREAM, packet, None);
}
