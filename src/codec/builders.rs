//! High-level packet constructors for every non-multiplayer server packet.
//!
//! Field orders here are a direct port of the upstream packet-building
//! functions (login/session/chat/spectator packets); the multiplayer match
//! packets live in `crate::multiplayer` next to the `Match`/`Slot` types
//! they serialize, since their payload shape depends on match state.

use bytes::Bytes;

use super::ids::ServerPacketId;
use super::packet::PacketBuilder;

pub fn login_reply(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::UserId).i32(user_id).finish()
}

/// `userId = -1` plus a human-readable reason, matching the upstream
/// convention of pairing a login failure with a notification.
pub fn login_failed() -> Bytes {
    login_reply(-1)
}

pub fn login_banned() -> Bytes {
    login_reply(-1)
}

pub fn silence_end_notify(seconds_left: u32) -> Bytes {
    PacketBuilder::new(ServerPacketId::SilenceEnd)
        .u32(seconds_left)
        .finish()
}

/// Always advertises protocol version 19, matching the upstream server's
/// hard-coded response.
pub fn protocol_version() -> Bytes {
    PacketBuilder::new(ServerPacketId::ProtocolVersion).i32(19).finish()
}

pub fn menu_icon(icon: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::MainMenuIcon).string(icon).finish()
}

bitflags::bitflags! {
    /// Bancho privilege bits advertised to the client, distinct from the
    /// database's own privilege bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BanchoPrivileges: i32 {
        const PLAYER = 1;
        const SUPPORTER = 1 << 2;
        const BAT = 1 << 3;
        const TOURNAMENT_STAFF = 1 << 4;
    }
}

pub fn bancho_priv(supporter: bool, bat: bool, tournament_staff: bool) -> Bytes {
    let mut result = BanchoPrivileges::PLAYER;
    if supporter {
        result |= BanchoPrivileges::SUPPORTER;
    }
    if bat {
        result |= BanchoPrivileges::BAT;
    }
    if tournament_staff {
        result |= BanchoPrivileges::TOURNAMENT_STAFF;
    }
    PacketBuilder::new(ServerPacketId::Privileges)
        .i32(result.bits())
        .finish()
}

pub fn friend_list(friend_ids: &[i32]) -> Bytes {
    PacketBuilder::new(ServerPacketId::FriendsList)
        .int_list(friend_ids)
        .finish()
}

pub fn user_logout(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::UserLogout)
        .i32(user_id)
        .u8(0)
        .finish()
}

/// Presence fields mirror the upstream `user_presence` packet exactly:
/// id, username, timezone byte (24 + utc offset), country, rank-colour
/// byte, longitude, latitude, global rank.
#[allow(clippy::too_many_arguments)]
pub fn user_presence(
    user_id: i32,
    username: &str,
    utc_offset: i8,
    country: u8,
    rank_colour: u8,
    longitude: f32,
    latitude: f32,
    global_rank: i32,
) -> Bytes {
    PacketBuilder::new(ServerPacketId::UserPresence)
        .i32(user_id)
        .string(username)
        .u8((24 + utc_offset as i16) as u8)
        .u8(country)
        .u8(rank_colour)
        .f32(longitude)
        .f32(latitude)
        .i32(global_rank)
        .finish()
}

/// A closed record for a session's broadcast stats, replacing the source's
/// duck-typed score object per the design notes.
pub struct UserStats {
    pub user_id: i32,
    pub action_id: u8,
    pub action_text: String,
    pub action_md5: String,
    pub action_mods: i32,
    pub game_mode: u8,
    pub beatmap_id: i32,
    pub ranked_score: i64,
    pub accuracy: f32,
    pub playcount: i32,
    pub total_score: i64,
    pub global_rank: i32,
    pub pp: i16,
}

pub fn user_stats(stats: &UserStats) -> Bytes {
    // PP is transmitted as a signed 16-bit value; once it would overflow that
    // range the upstream server swaps it into ranked score instead, since
    // relax/autopilot clients read ranked score as their leaderboard metric.
    let (ranked_score, pp) = if stats.pp >= i16::MAX - 1 {
        (stats.pp as i64, 0i16)
    } else {
        (stats.ranked_score, stats.pp)
    };

    PacketBuilder::new(ServerPacketId::UserStats)
        .i32(stats.user_id)
        .u8(stats.action_id)
        .string(&stats.action_text)
        .string(&stats.action_md5)
        .i32(stats.action_mods)
        .u8(stats.game_mode)
        .i32(stats.beatmap_id)
        .i64(ranked_score)
        .f32(stats.accuracy)
        .i32(stats.playcount)
        .i64(stats.total_score)
        .i32(stats.global_rank)
        .i16(pp)
        .finish()
}

pub fn send_message(from: &str, from_id: i32, message: &str, to: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::SendMessage)
        .string(from)
        .string(message)
        .string(to)
        .i32(from_id)
        .finish()
}

pub fn channel_join_success(channel: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::ChannelJoinSuccess)
        .string(channel)
        .finish()
}

pub fn channel_info(name: &str, description: &str, member_count: u16) -> Bytes {
    PacketBuilder::new(ServerPacketId::ChannelInfo)
        .string(name)
        .string(description)
        .u16(member_count)
        .finish()
}

pub fn channel_info_end() -> Bytes {
    PacketBuilder::new(ServerPacketId::ChannelInfoEnd).finish()
}

pub fn channel_kicked(channel: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::ChannelKicked)
        .string(channel)
        .finish()
}

pub fn silenced_notify(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::UserSilenced)
        .i32(user_id)
        .finish()
}

pub fn spectator_joined(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::SpectatorJoined)
        .i32(user_id)
        .finish()
}

pub fn spectator_left(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::SpectatorLeft)
        .i32(user_id)
        .finish()
}

/// Wraps `frame_data` verbatim: the server never interprets spectator frame
/// contents, only relays them (§4.5).
pub fn spectator_frames(frame_data: &[u8]) -> Bytes {
    PacketBuilder::new(ServerPacketId::SpectateFrames)
        .raw(frame_data)
        .finish()
}

pub fn spectator_song_missing(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::SpectatorCantSpectate)
        .i32(user_id)
        .finish()
}

pub fn fellow_spectator_joined(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::FellowSpectatorJoined)
        .i32(user_id)
        .finish()
}

pub fn fellow_spectator_left(user_id: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::FellowSpectatorLeft)
        .i32(user_id)
        .finish()
}

pub fn server_switch(address: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::SwitchServer)
        .string(address)
        .finish()
}

pub fn notification(message: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::Notification)
        .string(message)
        .finish()
}

/// `ms_until_reconnect` is milliseconds already doubled, per the Open
/// Questions decision in the full specification.
pub fn server_restart(ms_until_reconnect: i32) -> Bytes {
    PacketBuilder::new(ServerPacketId::Restart)
        .i32(ms_until_reconnect)
        .finish()
}

/// The numeric id for this one packet (`0x69`) was hard-coded in the source
/// rather than named in its constants module; it is reproduced verbatim
/// here as a named id instead of inline so it isn't invented twice.
pub fn rtx(message: &str) -> Bytes {
    PacketBuilder::new(ServerPacketId::Rtx).string(message).finish()
}

/// Payload for `server_restart` representing an unknown-token reply (§4.8,
/// §8 scenario S2): the client is told to reconnect.
pub fn unknown_token_restart() -> Bytes {
    server_restart(1000)
}

/// Reply to a client `Ping`, carrying no payload.
pub fn pong() -> Bytes {
    PacketBuilder::new(ServerPacketId::Pong).finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::packet::{PacketReader, HEADER_LEN};

    #[test]
    fn login_reply_carries_user_id() {
        let packet = login_reply(1234);
        let mut reader = PacketReader::new(&packet[HEADER_LEN..]);
        assert_eq!(reader.i32().unwrap(), 1234);
    }

    #[test]
    fn user_stats_overflow_pp_moves_into_ranked_score() {
        let stats = UserStats {
            user_id: 1,
            action_id: 0,
            action_text: String::new(),
            action_md5: String::new(),
            action_mods: 0,
            game_mode: 0,
            beatmap_id: 0,
            ranked_score: 500,
            accuracy: 99.0,
            playcount: 10,
            total_score: 1000,
            global_rank: 1,
            pp: i16::MAX,
        };
        let packet = user_stats(&stats);
        let mut reader = PacketReader::new(&packet[HEADER_LEN..]);
        reader.i32().unwrap(); // user_id
        reader.u8().unwrap(); // action_id
        reader.string().unwrap(); // action_text
        reader.string().unwrap(); // action_md5
        reader.i32().unwrap(); // action_mods
        reader.u8().unwrap(); // game_mode
        reader.i32().unwrap(); // beatmap_id
        let ranked_score = reader.i64().unwrap();
        assert_eq!(ranked_score, i16::MAX as i64);
    }
}
