//! The spectator subsystem (C5, §4.5): a host's follower set is realized
//! as the stream `spect/{hostUserId}`, paired with a private chat channel
//! created the first time a host gets a follower.

use std::sync::Arc;

use thiserror::Error;

use crate::channels::{spectator_channel_name, Channel};
use crate::chat;
use crate::codec::builders;
use crate::session::Session;
use crate::state::AppState;
use crate::types::UserId;

#[derive(Debug, Error)]
pub enum SpectatorError {
    #[error("target host is not online")]
    HostOffline,
}

fn stream_name(host_user_id: UserId) -> String {
    format!("spect/{host_user_id}")
}

/// Begins spectating `host_user_id`, first leaving any previous host
/// (§4.5 step 1).
pub fn start_spectating(
    state: &AppState,
    follower: &Arc<Session>,
    host_user_id: UserId,
) -> Result<(), SpectatorError> {
    if let Some(previous) = *follower.spectating.lock() {
        stop_spectating(state, follower, previous);
    }

    let host = state.sessions.by_user_id(host_user_id).ok_or(SpectatorError::HostOffline)?;

    let stream = stream_name(host_user_id);
    let was_empty = state.streams.member_count(&stream) == 0;
    let existing_followers = state.streams.members(&stream);

    state.streams.join(&stream, follower.id);
    *follower.spectating.lock() = Some(host_user_id);

    let fellow_joined = builders::fellow_spectator_joined(follower.user_id);
    for member in existing_followers {
        if let Some(session) = state.sessions.by_id(&member) {
            session.enqueue(fellow_joined.clone());
        }
    }
    host.enqueue(builders::spectator_joined(follower.user_id));

    let channel_name = spectator_channel_name(host_user_id);
    if was_empty {
        state.channels.ensure(Channel {
            name: channel_name.clone(),
            description: format!("Spectating {}", host.username),
            public_read: true,
            public_write: true,
            hidden: true,
            auto_join: false,
            min_privilege: 0,
        });
        let _ = chat::join_channel(state, &host, &channel_name);
    }
    let _ = chat::join_channel(state, follower, &channel_name);

    Ok(())
}

/// Reverses `start_spectating` (§4.5 "Stopping spectation").
pub fn stop_spectating(state: &AppState, follower: &Session, host_user_id: UserId) {
    let stream = stream_name(host_user_id);
    state.streams.leave(&stream, follower.id);
    *follower.spectating.lock() = None;

    if let Some(host) = state.sessions.by_user_id(host_user_id) {
        host.enqueue(builders::spectator_left(follower.user_id));
    }

    let fellow_left = builders::fellow_spectator_left(follower.user_id);
    for member in state.streams.members(&stream) {
        if let Some(session) = state.sessions.by_id(&member) {
            session.enqueue(fellow_left.clone());
        }
    }
}

/// Relays a host's spectate-frames payload to every follower verbatim
/// (§4.5 "When H sends spectator frames").
pub fn relay_frames(state: &AppState, host: &Session, payload: &[u8]) {
    let stream = stream_name(host.user_id);
    let packet = builders::spectator_frames(payload);
    state.streams.broadcast(&state.sessions, &stream, packet, None);
}

/// Forwards a follower's "can't spectate" to the host only. A host that has
/// since vanished is not an error: the caller just stops spectating (§4.5).
pub fn cant_spectate(state: &AppState, follower: &Session, host_user_id: UserId) {
    if let Some(host) = state.sessions.by_user_id(host_user_id) {
        host.enqueue(builders::spectator_song_missing(follower.user_id));
    }
}

/// Forcibly stops every follower of `host` (§4.5 "If H logs out").
pub fn host_logged_out(state: &AppState, host: &Session) {
    let stream = stream_name(host.user_id);
    for member in state.streams.members(&stream) {
        if let Some(follower) = state.sessions.by_id(&member) {
            *follower.spectating.lock() = None;
            follower.enqueue(builders::spectator_left(host.user_id));
        }
    }
    state.streams.remove_stream(&stream);
    state.channels.remove(&spectator_channel_name(host.user_id));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::StatsState;
    use crate::types::SessionId;

    fn make_session(user_id: i32, username: &str) -> Arc<Session> {
        Arc::new(Session::new(
            SessionId::new_v4(),
            user_id,
            username.to_owned(),
            1,
            0,
            0,
            0.0,
            0.0,
            false,
            StatsState::default(),
            false,
            false,
            0,
        ))
    }

    fn state_with(sessions: Vec<Arc<Session>>) -> AppState {
        let state = crate::state::test_support::bare_state();
        for session in sessions {
            state.sessions.insert(session);
        }
        state
    }

    #[test]
    fn first_follower_gets_spectator_joined_and_creates_channel() {
        let host = make_session(1, "host");
        let follower = make_session(2, "follower");
        let state = state_with(vec![host.clone(), follower.clone()]);

        start_spectating(&state, &follower, 1).unwrap();

        assert!(!host.fetch_queue().is_empty());
        assert!(state.channels.exists("#spect_1"));
        assert_eq!(*follower.spectating.lock(), Some(1));
    }

    #[test]
    fn second_follower_gets_fellow_joined_not_spectator_joined() {
        let host = make_session(1, "host");
        let f1 = make_session(2, "f1");
        let f2 = make_session(3, "f2");
        let state = state_with(vec![host.clone(), f1.clone(), f2.clone()]);

        start_spectating(&state, &f1, 1).unwrap();
        let _ = host.fetch_queue();
        let _ = f1.fetch_queue();

        start_spectating(&state, &f2, 1).unwrap();

        assert!(!f1.fetch_queue().is_empty());
        assert!(!host.fetch_queue().is_empty());
    }

    #[test]
    fn frames_reach_followers_but_not_host() {
        let host = make_session(1, "host");
        let follower = make_session(2, "follower");
        let state = state_with(vec![host.clone(), follower.clone()]);

        start_spectating(&state, &follower, 1).unwrap();
        let _ = host.fetch_queue();
        let _ = follower.fetch_queue();

        relay_frames(&state, &host, b"deterministic-payload");

        assert!(host.fetch_queue().is_empty());
        assert!(!follower.fetch_queue().is_empty());
    }

    #[test]
    fn host_logout_forces_every_follower_to_stop() {
        let host = make_session(1, "host");
        let follower = make_session(2, "follower");
        let state = state_with(vec![host.clone(), follower.clone()]);

        start_spectating(&state, &follower, 1).unwrap();
        host_logged_out(&state, &host);

        assert_eq!(*follower.spectating.lock(), None);
        assert_eq!(state.streams.member_count("spect/1"), 0);
    }

    #[test]
    fn starting_a_new_spectate_leaves_the_previous_host() {
        let host_a = make_session(1, "a");
        let host_b = make_session(2, "b");
        let follower = make_session(3, "f");
        let state = state_with(vec![host_a.clone(), host_b.clone(), follower.clone()]);

        start_spectating(&state, &follower, 1).unwrap();
        start_spectating(&state, &follower, 2).unwrap();

        assert_eq!(state.streams.member_count("spect/1"), 0);
        assert_eq!(state.streams.member_count("spect/2"), 1);
        assert_eq!(*follower.spectating.lock(), Some(2));
    }

    #[test]
    fn spectating_an_offline_host_fails() {
        let follower = make_session(2, "f");
        let state = state_with(vec![follower.clone()]);
        assert!(matches!(start_spectating(&state, &follower, 999), Err(SpectatorError::HostOffline)));
    }
}
