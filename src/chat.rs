//! Chat channel join/part and message distribution (C4, §4.4): public and
//! private channels are 1:1 paired with a `chat/{name}` stream; messages are
//! rejected outright while silenced, otherwise distributed and counted
//! against the spam threshold.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sea_orm::Value;
use thiserror::Error;

use crate::channels::Channel;
use crate::codec::builders;
use crate::presence;
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("channel does not exist")]
    NoSuchChannel,
    #[error("not a member of that channel")]
    NotJoined,
    #[error("insufficient privilege for that channel")]
    Forbidden,
    #[error("sender is currently silenced")]
    Silenced,
    #[error("target user is offline")]
    TargetOffline,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Joins `name`, enforcing the channel's minimum privilege (§4.4 "on
/// success the server sends the session a join-success packet and, to all
/// members, an updated channel-info packet").
pub fn join_channel(state: &AppState, session: &Arc<Session>, name: &str) -> Result<(), ChatError> {
    let channel = state.channels.get(name).ok_or(ChatError::NoSuchChannel)?;
    if channel.min_privilege != 0 && (session.privileges() & channel.min_privilege) == 0 {
        return Err(ChatError::Forbidden);
    }

    session.joined_channels.lock().insert(name.to_owned());
    state.streams.join(&channel.stream_name(), session.id);
    session.enqueue(builders::channel_join_success(name));
    broadcast_channel_info(state, &channel);
    Ok(())
}

/// Leaves `name`. `forced` sends a channel-kicked packet first (server-
/// initiated removal, e.g. a private channel's last reason to be in it
/// disappearing); a voluntary part does not.
pub fn part_channel(state: &AppState, session: &Session, name: &str, forced: bool) {
    let Some(channel) = state.channels.get(name) else {
        return;
    };
    session.joined_channels.lock().remove(name);
    state.streams.leave(&channel.stream_name(), session.id);
    if forced {
        session.enqueue(builders::channel_kicked(name));
    }
    broadcast_channel_info(state, &channel);
}

fn broadcast_channel_info(state: &AppState, channel: &Channel) {
    let member_count = state.streams.member_count(&channel.stream_name()) as u16;
    let packet = builders::channel_info(&channel.name, &channel.description, member_count);
    state.streams.broadcast(&state.sessions, &channel.stream_name(), packet, None);
}

/// Distributes a public channel message, then bumps the sender's spam
/// counter (§4.4 spam enforcement). Messages beginning with `!` are also
/// handed to the bot collaborator; any reply is posted back to the same
/// channel under the configured bot identity (§4.4, §6.4).
pub async fn send_public_message(
    state: &AppState,
    sender: &Arc<Session>,
    channel_name: &str,
    message: &str,
) -> Result<(), ChatError> {
    if sender.is_silenced(now()) {
        return Err(ChatError::Silenced);
    }
    let channel = state.channels.get(channel_name).ok_or(ChatError::NoSuchChannel)?;
    if !channel.public_write {
        return Err(ChatError::Forbidden);
    }
    if channel.min_privilege != 0 && (sender.privileges() & channel.min_privilege) == 0 {
        return Err(ChatError::Forbidden);
    }
    if !sender.joined_channels.lock().contains(channel_name) {
        return Err(ChatError::NotJoined);
    }

    let packet = builders::send_message(&sender.username, sender.user_id, message, channel_name);
    state.streams.broadcast(&state.sessions, &channel.stream_name(), packet, Some(sender.id));
    bump_spam_counter(state, sender);

    if let Some(args) = message.strip_prefix("!mp") {
        // The multiplayer command family is handled directly against match
        // state rather than through the generic `Bot` collaborator, which
        // has no notion of which match the sender is in (§6.4).
        let reply = crate::router::handle_mp_command(state, sender, args.trim_start());
        post_bot_reply(state, channel, &reply);
    } else if message.starts_with('!') {
        if let Some(reply) = state.collaborators.bot.respond(&sender.username, channel_name, message).await {
            post_bot_reply(state, channel, &reply.0);
        }
    }

    Ok(())
}

fn post_bot_reply(state: &AppState, channel: Channel, reply: &str) {
    let packet = builders::send_message(
        &state.config.branding.bot_username,
        state.config.branding.bot_user_id,
        reply,
        &channel.name,
    );
    state.streams.broadcast(&state.sessions, &channel.stream_name(), packet, None);
}

/// Delivers a private message to `target_username`, honouring the
/// recipient's non-friend DM block and queuing an away-message auto-reply
/// if one is set (§4.4, Glossary "Away message").
pub async fn send_private_message(
    state: &AppState,
    sender: &Arc<Session>,
    target_username: &str,
    message: &str,
) -> Result<(), ChatError> {
    if sender.is_silenced(now()) {
        return Err(ChatError::Silenced);
    }
    let target = state
        .sessions
        .by_username(target_username)
        .ok_or(ChatError::TargetOffline)?;

    if target.block_non_friend_dms.load(Ordering::Acquire)
        && !is_friend(state, target.user_id, sender.user_id).await
    {
        return Err(ChatError::Forbidden);
    }

    let packet = builders::send_message(&sender.username, sender.user_id, message, &target.username);
    target.enqueue(packet);

    if let Some(away) = target.away_message.lock().clone() {
        let reply = builders::send_message(&target.username, target.user_id, &away, &sender.username);
        sender.enqueue(reply);
    }

    bump_spam_counter(state, sender);

    if message.starts_with('!') {
        if let Some(reply) = state.collaborators.bot.respond(&sender.username, &target.username, message).await {
            let reply_packet = builders::send_message(
                &state.config.branding.bot_username,
                state.config.branding.bot_user_id,
                &reply.0,
                &state.config.branding.bot_username,
            );
            sender.enqueue(reply_packet);
        }
    }

    Ok(())
}

async fn is_friend(state: &AppState, user_id: crate::types::UserId, other_id: crate::types::UserId) -> bool {
    matches!(
        state
            .collaborators
            .db
            .fetch_one(
                "SELECT 1 AS present FROM users_relationships WHERE user1 = ? AND user2 = ? LIMIT 1",
                vec![Value::from(user_id), Value::from(other_id)],
            )
            .await,
        Ok(Some(_))
    )
}

/// Increments the sliding spam counter and silences the sender once it
/// crosses the configured threshold (§4.4, Glossary "Spam counter").
fn bump_spam_counter(state: &AppState, session: &Arc<Session>) {
    let count = session.spam_counter.fetch_add(1, Ordering::AcqRel) + 1;
    if count as u64 > state.config.silence.threshold as u64 {
        silence_session(session, state.config.silence.penalty_seconds);
    }
}

/// Silences `session` for `seconds`, notifying it immediately. Also used
/// by the admin-triggered `silence` bridge event (§4.9).
pub fn silence_session(session: &Session, seconds: u32) {
    let until = now() + seconds as i64;
    session.silence_end.store(until, Ordering::Release);
    session.spam_counter.store(0, Ordering::Release);
    session.enqueue(builders::silenced_notify(session.user_id));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::{Session, StatsState};
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

    fn state_with_osu(sessions: Vec<Arc<Session>>) -> AppState {
        let state = crate::state::test_support::bare_state();
        state.channels.ensure(Channel {
            name: "#osu".to_owned(),
            description: "Main channel".to_owned(),
            public_read: true,
            public_write: true,
            hidden: false,
            auto_join: true,
            min_privilege: 0,
        });
        for session in sessions {
            state.sessions.insert(session);
        }
        state
    }

    #[tokio::test]
    async fn join_then_send_reaches_other_members_but_not_the_sender() {
        let a = make_session(1, "alice");
        let b = make_session(2, "bob");
        let state = state_with_osu(vec![a.clone(), b.clone()]);

        join_channel(&state, &a, "#osu").unwrap();
        join_channel(&state, &b, "#osu").unwrap();
        // Drain the join-success/channel-info traffic so the assertions
        // below only reflect the message broadcast itself.
        a.fetch_queue();
        b.fetch_queue();

        send_public_message(&state, &a, "#osu", "hello").await.unwrap();

        assert!(a.fetch_queue().is_empty());
        assert!(!b.fetch_queue().is_empty());
    }

    #[tokio::test]
    async fn spam_over_threshold_silences_sender() {
        let a = make_session(1, "alice");
        let state = state_with_osu(vec![a.clone()]);
        join_channel(&state, &a, "#osu").unwrap();

        let threshold = state.config.silence.threshold;
        for _ in 0..threshold {
            send_public_message(&state, &a, "#osu", "spam").await.unwrap();
        }
        assert!(!a.is_silenced(now()));

        send_public_message(&state, &a, "#osu", "one more").await.unwrap();
        assert!(a.is_silenced(now()));

        let err = send_public_message(&state, &a, "#osu", "blocked").await.unwrap_err();
        assert!(matches!(err, ChatError::Silenced));
    }
}
