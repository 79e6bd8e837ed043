//! The packet router (C8, §4.8): dispatches each decoded inbound frame to
//! its handler. Ids are matched against the closed [`ClientPacketId`]
//! catalog rather than walked through a generic `Handler` trait object —
//! a flat jump table keyed by the numeric packet id, per the "static
//! handler table" design note — so adding a packet is one match arm, not
//! a new type.
//!
//! A restricted session is only ever dispatched the allow-listed ids
//! (§4.8); everything else is silently dropped. An unrecognized id is
//! logged and skipped rather than failing the request, since the codec
//! itself already rejected anything that doesn't even frame correctly.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sea_orm::Value;

use crate::channels::{match_channel_name, Channel};
use crate::chat;
use crate::codec::builders;
use crate::codec::ids::ClientPacketId;
use crate::codec::packet::{InboundFrame, PacketReader};
use crate::error::{BanchoError, MatchLogicError};
use crate::multiplayer::{self, codec as match_codec, Match, ReadyState, SettingsChange};
use crate::presence;
use crate::session::Session;
use crate::spectator;
use crate::state::AppState;
use crate::types::{MatchId, SlotIndex, UserId};

const LOBBY_STREAM: &str = "lobby";

/// Runs every frame in `frames` through [`dispatch_one`] in order. Meant to
/// be called with the sending session's `processing` lock already held
/// (§4.2, §5), so handlers never interleave with another request from the
/// same session.
pub async fn dispatch_frames(state: &Arc<AppState>, session: &Arc<Session>, frames: Vec<InboundFrame<'_>>) {
    for frame in frames {
        if session.is_kicked() {
            break;
        }

        let Some(id) = ClientPacketId::from_u16(frame.id) else {
            log::debug!("unrecognized client packet id {}", frame.id);
            continue;
        };

        if session.is_restricted() && !id.allowed_while_restricted() {
            continue;
        }

        let mut reader = PacketReader::new(frame.payload);
        if let Err(err) = dispatch_one(state, session, id, &mut reader).await {
            log::warn!("packet {id:?} from {} failed: {err}", session.username);
        }
    }
}

async fn dispatch_one(
    state: &Arc<AppState>,
    session: &Arc<Session>,
    id: ClientPacketId,
    reader: &mut PacketReader<'_>,
) -> Result<(), BanchoError> {
    use ClientPacketId::*;

    match id {
        ChangeAction => change_action(state, session, reader)?,
        SendPublicMessage => send_public_message(state, session, reader).await?,
        Logout => logout(state, session),
        RequestStatusUpdate => session.enqueue(presence::stats_packet(session)),
        Ping => session.enqueue(builders::pong()),
        StartSpectating => start_spectating(state, session, reader)?,
        StopSpectating => stop_spectating(state, session),
        SpectateFrames => spectator::relay_frames(state, session, reader.remaining()),
        ErrorReport => {
            log::debug!("client error report from {}: {} bytes", session.username, reader.remaining().len())
        }
        CantSpectate => cant_spectate(state, session),
        SendPrivateMessage => send_private_message(state, session, reader).await?,
        PartLobby => state.streams.leave(LOBBY_STREAM, session.id),
        JoinLobby => join_lobby(state, session),
        CreateMatch => create_match(state, session, reader)?,
        JoinMatch => join_match(state, session, reader)?,
        PartMatch => part_match(state, session),
        MatchChangeSlot => change_slot(state, session, reader)?,
        MatchReady => set_ready(state, session, ReadyState::Ready)?,
        MatchLock => toggle_lock(state, session, reader)?,
        MatchChangeSettings => change_settings(state, session, reader)?,
        MatchStart => match_start(state, session)?,
        MatchScoreUpdate => match_score_update(state, session, reader).await?,
        MatchComplete => match_complete(state, session)?,
        MatchChangeMods => change_mods(state, session, reader)?,
        MatchLoadComplete => match_load_complete(state, session)?,
        MatchNoBeatmap => set_ready(state, session, ReadyState::NoMap)?,
        MatchNotReady => set_ready(state, session, ReadyState::NotReady)?,
        MatchFailed => match_failed(state, session)?,
        MatchHasBeatmap => set_ready(state, session, ReadyState::NotReady)?,
        MatchSkipRequest => match_skip(state, session)?,
        ChannelJoin => channel_join(state, session, reader)?,
        BeatmapInfoRequest => {}
        MatchTransferHost => transfer_host(state, session, reader)?,
        FriendAdd => friend_add(state, session, reader).await,
        FriendRemove => friend_remove(state, session, reader).await,
        MatchChangeTeam => change_team(state, session)?,
        ChannelPart => channel_part(state, session, reader)?,
        ReceiveUpdates => {
            reader.i32()?;
        }
        SetAwayMessage => set_away_message(session, reader)?,
        UserStatsRequest => user_stats_request(state, session, reader)?,
        MatchInvite => match_invite(state, session, reader)?,
        MatchChangePassword => match_change_password(state, session, reader)?,
        TournamentMatchInfoRequest => tournament_match_info(state, session, reader)?,
        UserPresenceRequest => user_presence_request(state, session, reader)?,
        UserPresenceRequestAll => user_presence_request_all(state, session),
        ToggleBlockNonFriendDms => {
            let value = reader.i32()?;
            session.block_non_friend_dms.store(value != 0, Ordering::Release);
        }
        TournamentJoinMatchChannel => tournament_join_channel(state, session, reader)?,
        TournamentLeaveMatchChannel => tournament_leave_channel(state, session, reader)?,
    }

    Ok(())
}

fn change_action(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let action_id = reader.u8()?;
    let action_text = reader.string()?;
    let beatmap_md5 = reader.string()?;
    let mods = reader.i32()?;
    let game_mode = reader.u8()?;
    let beatmap_id = reader.i32()?;

    {
        let mut action = session.action.lock();
        action.action_id = action_id;
        action.action_text = action_text;
        action.beatmap_md5 = beatmap_md5;
        action.mods = mods;
        action.game_mode = game_mode;
        action.beatmap_id = beatmap_id;
    }
    presence::broadcast_stats(state, session);
    Ok(())
}

async fn send_public_message(
    state: &AppState,
    session: &Arc<Session>,
    reader: &mut PacketReader<'_>,
) -> Result<(), BanchoError> {
    reader.string()?; // sender username: unused, the server already knows who sent this.
    let message = reader.string()?;
    let channel_name = reader.string()?;
    reader.i32()?; // sender id: unused.

    chat::send_public_message(state, session, &channel_name, &message).await?;
    Ok(())
}

async fn send_private_message(
    state: &AppState,
    session: &Arc<Session>,
    reader: &mut PacketReader<'_>,
) -> Result<(), BanchoError> {
    reader.string()?; // sender username: unused.
    let message = reader.string()?;
    let target = reader.string()?;
    reader.i32()?; // sender id: unused.

    chat::send_private_message(state, session, &target, &message).await?;
    Ok(())
}

fn logout(state: &AppState, session: &Arc<Session>) {
    force_logout(state, session);
}

/// Full session teardown: leaves every stream/channel/match/spectator
/// relationship, announces the departure on `main`, and removes the
/// session from the registry (§3 lifecycle, §4.2 eviction). Used both by
/// the self-issued `Logout` packet and by anything that destroys a
/// session the client didn't ask to leave — timeout sweep, an external
/// ban/disconnect bridge event, or the drain-then-destroy step below for
/// a session another thread marked `kicked` mid-request (§4.2, §4.8).
///
/// Idempotent: a session already removed from the registry is left alone,
/// so calling this twice (e.g. self-logout followed by the router's
/// post-drain kicked check) never double-announces a departure.
pub(crate) fn force_logout(state: &AppState, session: &Arc<Session>) {
    session.kick();
    if state.sessions.by_id(&session.id).is_none() {
        return;
    }
    leave_everything(state, session);
    presence::announce_logout(state, session);
    state.sessions.remove(&session.id);
}

/// Tears down every collection a session participates in, short of the
/// session registry itself (§3 lifecycle).
fn leave_everything(state: &AppState, session: &Arc<Session>) {
    if let Some(host) = *session.spectating.lock() {
        spectator::stop_spectating(state, session, host);
    }
    spectator::host_logged_out(state, session);

    for channel_name in session.joined_channels.lock().clone() {
        chat::part_channel(state, session, &channel_name, false);
    }

    if let Some(match_id) = *session.match_id.lock() {
        if let Some(m) = state.matches.by_id(match_id) {
            leave_match(state, session, &m, match_id);
        }
    }

    state.streams.leave(LOBBY_STREAM, session.id);
}

fn start_spectating(state: &AppState, session: &Arc<Session>, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let host_user_id = reader.i32()?;
    let _ = spectator::start_spectating(state, session, host_user_id);
    Ok(())
}

fn stop_spectating(state: &AppState, session: &Arc<Session>) {
    if let Some(host) = session.spectating.lock().take() {
        spectator::stop_spectating(state, session, host);
    }
}

fn cant_spectate(state: &AppState, session: &Session) {
    if let Some(host) = *session.spectating.lock() {
        spectator::cant_spectate(state, session, host);
    }
}

fn join_lobby(state: &AppState, session: &Arc<Session>) {
    state.streams.join(LOBBY_STREAM, session.id);
    for m in state.matches.all() {
        let packet = m.with_state(match_codec::new_match);
        session.enqueue(packet);
    }
}

fn create_match(state: &AppState, session: &Arc<Session>, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let data = match_codec::read_match_data(reader)?;

    let m = state.matches.create(multiplayer::NewMatchArgs {
        name: data.name,
        password: data.password,
        beatmap_id: data.beatmap_id,
        beatmap_name: data.beatmap_name,
        beatmap_md5: data.beatmap_md5,
        game_mode: data.game_mode,
        creator_user_id: session.user_id,
    });

    *session.match_id.lock() = Some(m.id);
    state.streams.join(&format!("multi/{}", m.id), session.id);

    let channel_name = match_channel_name(m.id);
    state.channels.ensure(Channel {
        name: channel_name.clone(),
        description: "Multiplayer match".to_owned(),
        public_read: true,
        public_write: true,
        hidden: true,
        auto_join: false,
        min_privilege: 0,
    });
    let _ = chat::join_channel(state, session, &channel_name);

    session.enqueue(m.with_state(match_codec::match_join_success));
    let lobby_packet = m.with_state(match_codec::new_match);
    state.streams.broadcast(&state.sessions, LOBBY_STREAM, lobby_packet, Some(session.id));
    Ok(())
}

fn join_match(state: &AppState, session: &Arc<Session>, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let match_id = reader.i32()? as MatchId;
    let password = reader.string()?;

    let Some(m) = state.matches.by_id(match_id) else {
        session.enqueue(match_codec::match_join_fail());
        return Ok(());
    };

    match multiplayer::join(&m, &password, session.user_id) {
        Ok(_) => {
            *session.match_id.lock() = Some(match_id);
            state.streams.join(&format!("multi/{match_id}"), session.id);
            let channel_name = match_channel_name(match_id);
            let _ = chat::join_channel(state, session, &channel_name);

            session.enqueue(m.with_state(match_codec::match_join_success));
            broadcast_match_update(state, match_id, &m);
        }
        Err(_) => session.enqueue(match_codec::match_join_fail()),
    }
    Ok(())
}

fn part_match(state: &AppState, session: &Arc<Session>) {
    let Some(match_id) = session.match_id.lock().take() else {
        return;
    };
    let Some(m) = state.matches.by_id(match_id) else {
        return;
    };
    leave_match(state, session, &m, match_id);
}

fn leave_match(state: &AppState, session: &Session, m: &Arc<Match>, match_id: MatchId) {
    let outcome = multiplayer::leave(m, session.user_id);
    state.streams.leave(&format!("multi/{match_id}"), session.id);
    state.streams.leave(&format!("multi/{match_id}/playing"), session.id);
    chat::part_channel(state, session, &match_channel_name(match_id), false);

    if outcome.disposed {
        state.matches.remove(match_id);
        state.streams.remove_stream(&format!("multi/{match_id}"));
        state.streams.remove_stream(&format!("multi/{match_id}/playing"));
        state.channels.remove(&match_channel_name(match_id));
        state.streams.broadcast(&state.sessions, LOBBY_STREAM, match_codec::dispose_match(match_id), None);
        return;
    }

    if let Some(new_host) = outcome.new_host {
        state.streams.broadcast(
            &state.sessions,
            &format!("multi/{match_id}"),
            match_codec::match_new_host(new_host),
            None,
        );
    }
    broadcast_match_update(state, match_id, m);
}

fn current_match(state: &AppState, session: &Session) -> Result<(MatchId, Arc<Match>), BanchoError> {
    let match_id = session.match_id.lock().ok_or(MatchLogicError::NoSuchMatch)?;
    let m = state.matches.by_id(match_id).ok_or(MatchLogicError::NoSuchMatch)?;
    Ok((match_id, m))
}

/// Broadcasts a censored match-update to the match's own stream and to the
/// lobby (every lobby member tracks every open match's live state, §4.6).
fn broadcast_match_update(state: &AppState, match_id: MatchId, m: &Match) {
    let update = m.with_state(match_codec::match_update_censored);
    state.streams.broadcast(&state.sessions, &format!("multi/{match_id}"), update.clone(), None);
    state.streams.broadcast(&state.sessions, LOBBY_STREAM, update, None);
}

fn change_slot(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let target = reader.i32()? as SlotIndex;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::change_slot(&m, session.user_id, target)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn set_ready(state: &AppState, session: &Session, ready_state: ReadyState) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    multiplayer::set_ready_state(&m, session.user_id, ready_state)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn toggle_lock(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let target = reader.i32()? as SlotIndex;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::toggle_lock(&m, session.user_id, target)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn change_settings(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let data = match_codec::read_match_data(reader)?;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::change_settings(
        &m,
        session.user_id,
        SettingsChange {
            name: data.name,
            password: data.password,
            beatmap_id: data.beatmap_id,
            beatmap_name: data.beatmap_name,
            beatmap_md5: data.beatmap_md5,
            game_mode: data.game_mode,
            scoring_type: data.scoring_type,
            team_type: data.team_type,
            free_mods: data.free_mods,
        },
    )?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn change_mods(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let mods = reader.i32()?;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::change_mods(&m, session.user_id, mods)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn change_team(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    multiplayer::change_team(&m, session.user_id)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn transfer_host(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    // MatchTransferHost carries a slot index, not a user id (matches the
    // upstream client's `["slotID", UINT32]` structure).
    let target_slot = reader.i32()? as SlotIndex;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::transfer_host(&m, session.user_id, target_slot)?;
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn match_start(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    let playing = multiplayer::start(&m, session.user_id)?;

    let playing_stream = format!("multi/{match_id}/playing");
    for user_id in playing {
        if let Some(other) = state.sessions.by_user_id(user_id) {
            state.streams.join(&playing_stream, other.id);
        }
    }

    let packet = m.with_state(match_codec::match_start);
    state.streams.broadcast(&state.sessions, &format!("multi/{match_id}"), packet, None);
    broadcast_match_update(state, match_id, &m);
    Ok(())
}

fn match_load_complete(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    if multiplayer::mark_loaded(&m, session.user_id)? {
        state.streams.broadcast(
            &state.sessions,
            &format!("multi/{match_id}/playing"),
            match_codec::match_all_players_loaded(),
            None,
        );
    }
    Ok(())
}

fn match_skip(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    let all_skipped = multiplayer::request_skip(&m, session.user_id)?;
    state.streams.broadcast(
        &state.sessions,
        &format!("multi/{match_id}"),
        match_codec::match_player_skipped(session.user_id),
        None,
    );
    if all_skipped {
        state.streams.broadcast(&state.sessions, &format!("multi/{match_id}"), match_codec::match_all_skipped(), None);
    }
    Ok(())
}

fn match_failed(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    let slot = multiplayer::mark_failed(&m, session.user_id)?;
    state.streams.broadcast(
        &state.sessions,
        &format!("multi/{match_id}"),
        match_codec::match_player_failed(slot),
        None,
    );
    Ok(())
}

fn match_complete(state: &AppState, session: &Session) -> Result<(), BanchoError> {
    let (match_id, m) = current_match(state, session)?;
    let all_done = multiplayer::mark_completed(&m, session.user_id)?;
    if all_done {
        let playing_stream = format!("multi/{match_id}/playing");
        state.streams.broadcast(&state.sessions, &playing_stream, match_codec::match_complete(), None);
        for member in state.streams.members(&playing_stream) {
            state.streams.leave(&playing_stream, member);
        }
        broadcast_match_update(state, match_id, &m);
    }
    Ok(())
}

async fn match_score_update(
    state: &AppState,
    session: &Session,
    reader: &mut PacketReader<'_>,
) -> Result<(), BanchoError> {
    let frame = match_codec::read_score_frame(reader)?;
    let (match_id, m) = current_match(state, session)?;
    let (slot, pending) = multiplayer::apply_score_update(&m, session.user_id, &frame)?;

    let total_score = if let Some(lookup) = pending {
        let pp = state
            .collaborators
            .pp
            .calculate(
                lookup.beatmap_id,
                lookup.game_mode,
                lookup.mods,
                lookup.max_combo as i32,
                lookup.accuracy,
                lookup.miss_count as i32,
                lookup.passed_objects as i32,
            )
            .await;
        let rounded = pp.pp.round() as i32;
        multiplayer::apply_pp_result(&m, slot, rounded);
        rounded as i64
    } else {
        frame.total_score as i64
    };

    let packet = match_codec::match_score_update(slot, &frame, total_score);
    state.streams.broadcast(&state.sessions, &format!("multi/{match_id}/playing"), packet, None);
    Ok(())
}

fn channel_join(state: &AppState, session: &Arc<Session>, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let name = reader.string()?;
    chat::join_channel(state, session, &name)?;
    Ok(())
}

fn channel_part(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let name = reader.string()?;
    chat::part_channel(state, session, &name, false);
    Ok(())
}

async fn friend_add(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) {
    let Ok(target) = reader.i32() else { return };
    let _ = state
        .collaborators
        .db
        .execute(
            "INSERT INTO users_relationships (user1, user2) VALUES (?, ?) ON DUPLICATE KEY UPDATE user2 = user2",
            vec![Value::from(session.user_id), Value::from(target)],
        )
        .await;
}

async fn friend_remove(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) {
    let Ok(target) = reader.i32() else { return };
    let _ = state
        .collaborators
        .db
        .execute(
            "DELETE FROM users_relationships WHERE user1 = ? AND user2 = ?",
            vec![Value::from(session.user_id), Value::from(target)],
        )
        .await;
}

fn set_away_message(session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let message = reader.string()?;
    *session.away_message.lock() = if message.is_empty() { None } else { Some(message) };
    Ok(())
}

fn user_stats_request(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let ids = reader.int_list()?;
    for id in ids {
        if let Some(other) = state.sessions.by_user_id(id as UserId) {
            session.enqueue(presence::stats_packet(&other));
        }
    }
    Ok(())
}

fn match_invite(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let target_id = reader.i32()?;
    if let Some(target) = state.sessions.by_user_id(target_id as UserId) {
        let message = format!("Come join my multiplayer match: {}", session.username);
        target.enqueue(builders::send_message(&session.username, session.user_id, &message, &target.username));
    }
    Ok(())
}

fn match_change_password(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    // Same wire structure as MatchChangeSettings (the osu! client reuses the
    // full match-data struct here too); only `data.password` is consulted.
    let data = match_codec::read_match_data(reader)?;
    let (match_id, m) = current_match(state, session)?;
    multiplayer::change_password(&m, session.user_id, data.password.clone())?;
    state.streams.broadcast(
        &state.sessions,
        &format!("multi/{match_id}"),
        match_codec::match_change_password(&data.password),
        None,
    );
    Ok(())
}

/// The `!mp` chat command family (§6.4): a thin text front-end over the
/// same match mutators the binary protocol handlers above call, so a
/// match can be run entirely from the `#multi_{id}` chat without a
/// client that implements every multiplayer packet. Unlike `!help`/`!roll`
/// this needs a live session and match context, so it's handled here
/// rather than behind the generic `Bot` collaborator trait, and dispatched
/// from [`crate::chat::send_public_message`] before that trait ever sees
/// the message. Returns the text to post back under the bot's identity.
pub(crate) fn handle_mp_command(state: &AppState, session: &Arc<Session>, args: &str) -> String {
    let mut words = args.split_whitespace();
    let Some(sub) = words.next() else {
        return "Usage: !mp <start|abort|lock|unlock|invite|password|host|scorev1|scorev2>".to_owned();
    };

    let Ok((match_id, m)) = current_match(state, session) else {
        return "You are not in a multiplayer match.".to_owned();
    };

    let result = match sub.to_lowercase().as_str() {
        "start" => multiplayer::start(&m, session.user_id).map(|playing| {
            let playing_stream = format!("multi/{match_id}/playing");
            for user_id in playing {
                if let Some(other) = state.sessions.by_user_id(user_id) {
                    state.streams.join(&playing_stream, other.id);
                }
            }
            state.streams.broadcast(
                &state.sessions,
                &format!("multi/{match_id}"),
                m.with_state(match_codec::match_start),
                None,
            );
            "The match has started.".to_owned()
        }),
        "abort" => multiplayer::abort(&m, session.user_id).map(|()| "The match has been aborted.".to_owned()),
        "lock" | "unlock" => match words.next().and_then(|s| s.parse::<SlotIndex>().ok()) {
            Some(slot) => multiplayer::toggle_lock(&m, session.user_id, slot).map(|()| format!("Slot {slot} toggled.")),
            None => return "Usage: !mp lock <slot>".to_owned(),
        },
        "invite" => {
            let Some(username) = words.next() else {
                return "Usage: !mp invite <username>".to_owned();
            };
            let Some(target) = state.sessions.by_username(username) else {
                return format!("{username} is not online.");
            };
            let message = format!("Come join my multiplayer match: {}", session.username);
            target.enqueue(builders::send_message(&session.username, session.user_id, &message, &target.username));
            return format!("Invited {username}.");
        }
        "password" => {
            let password = words.next().unwrap_or("").to_owned();
            multiplayer::change_password(&m, session.user_id, password.clone()).map(|()| {
                state.streams.broadcast(
                    &state.sessions,
                    &format!("multi/{match_id}"),
                    match_codec::match_change_password(&password),
                    None,
                );
                if password.is_empty() {
                    "Password removed.".to_owned()
                } else {
                    "Password changed.".to_owned()
                }
            })
        }
        "host" => {
            let Some(username) = words.next() else {
                return "Usage: !mp host <username>".to_owned();
            };
            let Some(target) = state.sessions.by_username(username) else {
                return format!("{username} is not online.");
            };
            let Some(target_slot) = multiplayer::slot_of(&m, target.user_id) else {
                return format!("{username} is not in this match.");
            };
            multiplayer::transfer_host(&m, session.user_id, target_slot).map(|()| format!("{username} is now the host."))
        }
        "scorev1" | "scorev2" => {
            let scoring_type = if sub.eq_ignore_ascii_case("scorev2") {
                multiplayer::ScoringType::ScoreV2
            } else {
                multiplayer::ScoringType::Score
            };
            multiplayer::change_settings(
                &m,
                session.user_id,
                m.with_state(|state| SettingsChange {
                    name: state.name.clone(),
                    password: state.password.clone(),
                    beatmap_id: state.beatmap_id,
                    beatmap_name: state.beatmap_name.clone(),
                    beatmap_md5: state.beatmap_md5.clone(),
                    game_mode: state.game_mode,
                    scoring_type,
                    team_type: state.team_type,
                    free_mods: state.free_mods,
                }),
            )
            .map(|()| format!("Scoring mode set to {sub}."))
        }
        "help" => return "Available commands: start, abort, lock <slot>, unlock <slot>, invite <user>, password [pw], host <user>, scorev1, scorev2.".to_owned(),
        _ => return format!("Unknown !mp command: {sub}. Try !mp help."),
    };

    match result {
        Ok(reply) => {
            broadcast_match_update(state, match_id, &m);
            reply
        }
        Err(MatchLogicError::NotHost) => "Only the match host can do that.".to_owned(),
        Err(err) => format!("Could not do that: {err}"),
    }
}

fn tournament_match_info(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let match_id = reader.i32()? as MatchId;
    if let Some(m) = state.matches.by_id(match_id) {
        session.enqueue(m.with_state(match_codec::match_update));
    }
    Ok(())
}

fn user_presence_request(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let ids = reader.int_list()?;
    for id in ids {
        if let Some(other) = state.sessions.by_user_id(id as UserId) {
            session.enqueue(presence::presence_packet(&other));
        }
    }
    Ok(())
}

fn user_presence_request_all(state: &AppState, session: &Session) {
    for other in state.sessions.all() {
        if other.id != session.id && !other.is_restricted() {
            session.enqueue(presence::presence_packet(&other));
        }
    }
}

fn tournament_join_channel(state: &AppState, session: &Arc<Session>, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let match_id = reader.i32()? as MatchId;
    let _ = chat::join_channel(state, session, &match_channel_name(match_id));
    Ok(())
}

fn tournament_leave_channel(state: &AppState, session: &Session, reader: &mut PacketReader<'_>) -> Result<(), BanchoError> {
    let match_id = reader.i32()? as MatchId;
    chat::part_channel(state, session, &match_channel_name(match_id), false);
    Ok(())
}
