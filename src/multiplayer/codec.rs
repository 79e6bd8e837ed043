//! Multiplayer packet builders. Field order is a direct port of the
//! upstream match-struct serializer: id, in-progress, match type, mods,
//! name, password, beatmap name/id/md5, 16 slot statuses, 16 slot teams,
//! then an `i32` user id per occupied slot, host id, game mode, scoring
//! type, team type, free-mods flag, and (only when free mods is on) 16
//! per-slot mods plus a trailing random seed.

use bytes::Bytes;

use super::{MatchState, ScoreFrame, ScoringType, SlotIndex, TeamType};
use crate::codec::error::CodecError;
use crate::codec::ids::ServerPacketId;
use crate::codec::packet::{PacketBuilder, PacketReader};
use crate::types::MAX_SLOTS;

fn build_match_data(state: &MatchState, id: ServerPacketId, censor_password: bool) -> Bytes {
    let password = if censor_password && !state.password.is_empty() {
        "*".to_owned()
    } else {
        state.password.clone()
    };

    let mut builder = PacketBuilder::new(id)
        .u16(state.id)
        .u8(state.in_progress as u8)
        .u8(0) // match type: always 0, the upstream server never used the "powerplay" alternative.
        .i32(state.mods)
        .string(&state.name)
        .string(&password)
        .string(&state.beatmap_name)
        .i32(state.beatmap_id)
        .string(&state.beatmap_md5);

    for slot in &state.slots {
        builder = builder.u8(slot.status as u8);
    }
    for slot in &state.slots {
        builder = builder.u8(slot.team as u8);
    }
    for slot in &state.slots {
        if slot.status.has_player() {
            builder = builder.i32(slot.user_id.expect("has_player implies user_id"));
        }
    }

    builder = builder
        .i32(state.host_user_id)
        .u8(state.game_mode)
        .u8(state.scoring_type as u8)
        .u8(state.team_type as u8)
        .u8(state.free_mods as u8);

    if state.free_mods {
        for slot in &state.slots {
            builder = builder.i32(slot.mods);
        }
    }

    builder = builder.i32(0); // seed: only meaningful for mania random mod, unused otherwise.
    builder.finish()
}

pub fn new_match(state: &MatchState) -> Bytes {
    build_match_data(state, ServerPacketId::NewMatch, true)
}

pub fn match_update(state: &MatchState) -> Bytes {
    build_match_data(state, ServerPacketId::UpdateMatch, false)
}

pub fn match_update_censored(state: &MatchState) -> Bytes {
    build_match_data(state, ServerPacketId::UpdateMatch, true)
}

pub fn dispose_match(match_id: crate::types::MatchId) -> Bytes {
    PacketBuilder::new(ServerPacketId::DisposeMatch).i32(match_id as i32).finish()
}

pub fn match_join_success(state: &MatchState) -> Bytes {
    build_match_data(state, ServerPacketId::MatchJoinSuccess, false)
}

pub fn match_join_fail() -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchJoinFail).finish()
}

pub fn match_change_password(password: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchChangePassword).string(password).finish()
}

pub fn match_start(state: &MatchState) -> Bytes {
    build_match_data(state, ServerPacketId::MatchStart, false)
}

pub fn match_all_players_loaded() -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchAllPlayersLoaded).finish()
}

pub fn match_player_skipped(user_id: crate::types::UserId) -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchPlayerSkipped).i32(user_id).finish()
}

pub fn match_all_skipped() -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchAllSkipped).finish()
}

/// A repacked score frame with the server-known slot id, broadcast on
/// `multi/{mid}/playing` (§4.6 Per-frame updates).
pub fn match_score_update(slot: SlotIndex, frame: &ScoreFrame, total_score: i64) -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchScoreUpdate)
        .i32(frame.time)
        .u8(slot as u8)
        .u16(frame.count_300)
        .u16(frame.count_100)
        .u16(frame.count_50)
        .u16(frame.count_geki)
        .u16(frame.count_katu)
        .u16(frame.count_miss)
        .i32(total_score as i32)
        .u16(frame.max_combo)
        .u16(frame.current_combo)
        .u8(frame.perfect as u8)
        .u8(frame.current_hp)
        .u8(frame.tag_byte)
        .u8(frame.using_score_v2 as u8)
        .finish()
}

pub fn match_complete() -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchComplete).finish()
}

pub fn match_player_failed(slot: SlotIndex) -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchPlayerFailed).i32(slot as i32).finish()
}

pub fn match_new_host(user_id: crate::types::UserId) -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchNewHost).i32(user_id).finish()
}

pub fn match_abort() -> Bytes {
    PacketBuilder::new(ServerPacketId::MatchAbort).finish()
}

/// The subset of a client-sent match struct the server actually needs, read
/// in the same field order [`build_match_data`] writes (§4.6 Creation,
/// Change-settings). The slot status/team/occupant arrays are walked to
/// stay aligned on the wire, then discarded: the server is the only source
/// of truth for who is seated where.
pub struct ClientMatchData {
    pub name: String,
    pub password: String,
    pub beatmap_name: String,
    pub beatmap_id: i32,
    pub beatmap_md5: String,
    pub game_mode: u8,
    pub scoring_type: ScoringType,
    pub team_type: TeamType,
    pub free_mods: bool,
}

fn status_has_player(byte: u8) -> bool {
    matches!(byte, 4 | 8 | 16 | 32 | 64 | 128)
}

fn scoring_type_from_u8(value: u8) -> ScoringType {
    match value {
        1 => ScoringType::Accuracy,
        2 => ScoringType::Combo,
        3 => ScoringType::ScoreV2,
        _ => ScoringType::Score,
    }
}

fn team_type_from_u8(value: u8) -> TeamType {
    match value {
        1 => TeamType::TagCoop,
        2 => TeamType::TeamVs,
        3 => TeamType::TagTeamVs,
        _ => TeamType::HeadToHead,
    }
}

pub fn read_match_data(reader: &mut PacketReader) -> Result<ClientMatchData, CodecError> {
    let _match_id = reader.u16()?;
    let _in_progress = reader.u8()?;
    let _match_type = reader.u8()?;
    let _mods = reader.i32()?;
    let name = reader.string()?;
    let password = reader.string()?;
    let beatmap_name = reader.string()?;
    let beatmap_id = reader.i32()?;
    let beatmap_md5 = reader.string()?;

    let mut statuses = [0u8; MAX_SLOTS];
    for status in statuses.iter_mut() {
        *status = reader.u8()?;
    }
    for _ in 0..MAX_SLOTS {
        reader.u8()?; // slot team, unused: the server assigns teams itself.
    }
    for status in statuses {
        if status_has_player(status) {
            reader.i32()?; // occupant user id, unused: the server already knows its own occupants.
        }
    }

    let _host_id = reader.i32()?;
    let game_mode = reader.u8()?;
    let scoring_type = scoring_type_from_u8(reader.u8()?);
    let team_type = team_type_from_u8(reader.u8()?);
    let free_mods = reader.u8()? != 0;

    Ok(ClientMatchData {
        name,
        password,
        beatmap_name,
        beatmap_id,
        beatmap_md5,
        game_mode,
        scoring_type,
        team_type,
        free_mods,
    })
}

/// Reads a client score-update frame, discarding the client-reported slot
/// id (§4.6 Per-frame updates: the server recomputes it from `user_id`).
pub fn read_score_frame(reader: &mut PacketReader) -> Result<ScoreFrame, CodecError> {
    let time = reader.i32()?;
    let _slot_id = reader.u8()?;
    let count_300 = reader.u16()?;
    let count_100 = reader.u16()?;
    let count_50 = reader.u16()?;
    let count_geki = reader.u16()?;
    let count_katu = reader.u16()?;
    let count_miss = reader.u16()?;
    let total_score = reader.i32()?;
    let max_combo = reader.u16()?;
    let current_combo = reader.u16()?;
    let perfect = reader.u8()? != 0;
    let current_hp = reader.u8()?;
    let tag_byte = reader.u8()?;
    let using_score_v2 = reader.u8()? != 0;

    Ok(ScoreFrame {
        time,
        count_300,
        count_100,
        count_50,
        count_geki,
        count_katu,
        count_miss,
        total_score,
        max_combo,
        current_combo,
        perfect,
        current_hp,
        tag_byte,
        using_score_v2,
    })
}

#[cfg(test)]
mod read_test {
    use super::*;
    use crate::codec::packet::PacketBuilder;

    #[test]
    fn read_match_data_round_trips_through_build_match_data() {
        let matches = crate::multiplayer::Matches::new();
        let m = matches.create(crate::multiplayer::NewMatchArgs {
            name: "room".to_owned(),
            password: "secret".to_owned(),
            beatmap_id: 5,
            beatmap_name: "song".to_owned(),
            beatmap_md5: "hash".to_owned(),
            game_mode: 0,
            creator_user_id: 42,
        });
        let packet = m.with_state(|state| build_match_data(state, ServerPacketId::NewMatch, false));

        let mut reader = PacketReader::new(&packet[crate::codec::packet::HEADER_LEN..]);
        let parsed = read_match_data(&mut reader).unwrap();
        assert_eq!(parsed.name, "room");
        assert_eq!(parsed.password, "secret");
        assert_eq!(parsed.beatmap_id, 5);
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn read_score_frame_discards_client_slot_id() {
        let packet = PacketBuilder::new(ServerPacketId::MatchScoreUpdate)
            .i32(1000)
            .u8(7)
            .u16(10)
            .u16(2)
            .u16(1)
            .u16(0)
            .u16(0)
            .u16(0)
            .i32(500_000)
            .u16(50)
            .u16(20)
            .u8(1)
            .u8(100)
            .u8(0)
            .u8(0)
            .finish();
        let mut reader = PacketReader::new(&packet[crate::codec::packet::HEADER_LEN..]);
        let frame = read_score_frame(&mut reader).unwrap();
        assert_eq!(frame.time, 1000);
        assert_eq!(frame.count_300, 10);
        assert_eq!(frame.total_score, 500_000);
        assert!(reader.remaining().is_empty());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::multiplayer::{Matches, NewMatchArgs};

    #[test]
    fn match_data_carries_only_occupied_user_ids() {
        let matches = Matches::new();
        let m = matches.create(NewMatchArgs {
            name: "room".to_owned(),
            password: "secret".to_owned(),
            beatmap_id: 5,
            beatmap_name: "song".to_owned(),
            beatmap_md5: "hash".to_owned(),
            game_mode: 0,
            creator_user_id: 42,
        });

        let packet = m.with_state(|state| match_update_censored(state));
        assert!(!packet.is_empty());
        assert_ne!(packet.len(), 0);
    }
}
