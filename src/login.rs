//! The login pipeline (C7, §4.7): parses the three-line handshake body,
//! authenticates against the relational store, enforces the privilege
//! ordering (banned / pending-verification / frozen), screens for known
//! cheat clients, records hardware/IP, resolves geo, and — on success —
//! installs a session and enqueues the ordered welcome sequence.

use std::net::IpAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use sea_orm::Value;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::channels::Channel;
use crate::chat;
use crate::codec::builders;
use crate::country;
use crate::hashing;
use crate::hwid::HardwareIds;
use crate::presence;
use crate::privileges::Privileges;
use crate::session::{Session, StatsState};
use crate::state::AppState;
use crate::types::{SessionId, UserId};

#[derive(Debug, Error)]
enum HandshakeError {
    #[error("malformed handshake body")]
    Malformed,
}

struct Handshake {
    username: String,
    password_md5: String,
    client_version: String,
    utc_offset: i8,
    hwid: Option<HardwareIds>,
    block_non_friend_dms: bool,
}

/// Parses the three newline-separated sections (§4.7). The third line's
/// pipe-separated fields are `client-version|utc-offset|display-city|
/// hwid-hashes|block-nonfriend-pm`; display city is accepted but unused.
fn parse_handshake(body: &[u8]) -> Result<Handshake, HandshakeError> {
    let text = std::str::from_utf8(body).map_err(|_| HandshakeError::Malformed)?;
    let mut lines = text.split('\n');
    let username = lines.next().ok_or(HandshakeError::Malformed)?.trim().to_owned();
    let password_md5 = lines.next().ok_or(HandshakeError::Malformed)?.trim().to_owned();
    let info_line = lines.next().ok_or(HandshakeError::Malformed)?.trim();

    if username.is_empty() || password_md5.is_empty() {
        return Err(HandshakeError::Malformed);
    }

    let fields: Vec<&str> = info_line.split('|').collect();
    if fields.len() < 4 {
        return Err(HandshakeError::Malformed);
    }

    let client_version = fields[0].to_owned();
    let utc_offset: i8 = fields[1].trim().parse().unwrap_or(0);
    let hwid = HardwareIds::parse(fields[3]);
    let block_non_friend_dms = fields.get(4).map(|f| f.trim() == "1").unwrap_or(false);

    Ok(Handshake {
        username,
        password_md5,
        client_version,
        utc_offset,
        hwid,
        block_non_friend_dms,
    })
}

/// Lowercases and collapses spaces to underscores, matching the unique key
/// every username is indexed under (§4.7 step 2).
pub(crate) fn safe_username(username: &str) -> String {
    username.to_ascii_lowercase().replace(' ', "_")
}

/// A small, documented block-list of build strings known to belong to
/// modified clients, plus the "skoot" and non-`b`-prefixed shapes and the
/// minimum-year check (§4.7 step 6). New signatures are appended here,
/// never inferred from behavior.
const CHEAT_CLIENT_VERSIONS: &[&str] = &["b20130815.912160cutting", "b19700101.1"];

fn is_cheat_client(version: &str, minimum_year: u16) -> bool {
    if CHEAT_CLIENT_VERSIONS.contains(&version) {
        return true;
    }
    if version.to_ascii_lowercase().starts_with("skoot") {
        return true;
    }
    if !version.starts_with('b') {
        return true;
    }
    match version.get(1..5).and_then(|year| year.parse::<u16>().ok()) {
        Some(year) => year < minimum_year,
        None => true,
    }
}

struct UserRow {
    id: UserId,
    username: String,
    password_hash: String,
    privileges: Privileges,
    country: String,
    silence_end: i64,
    donor_expire: i64,
    frozen_until: i64,
}

fn row_str(row: &JsonValue, field: &str) -> String {
    row.get(field).and_then(JsonValue::as_str).unwrap_or("").to_owned()
}

fn row_i64(row: &JsonValue, field: &str) -> i64 {
    row.get(field).and_then(JsonValue::as_i64).unwrap_or(0)
}

fn user_from_row(row: JsonValue) -> UserRow {
    UserRow {
        id: row_i64(&row, "id") as UserId,
        username: row_str(&row, "username"),
        password_hash: row_str(&row, "password"),
        privileges: Privileges::from_bits_truncate(row_i64(&row, "privileges")),
        country: row_str(&row, "country"),
        silence_end: row_i64(&row, "silence_end"),
        donor_expire: row_i64(&row, "donor_expire"),
        frozen_until: row_i64(&row, "frozen_until"),
    }
}

async fn find_user(state: &AppState, safe: &str) -> Option<UserRow> {
    state
        .collaborators
        .db
        .fetch_one(
            "SELECT id, username, password, privileges, country, silence_end, donor_expire, frozen_until \
             FROM users WHERE username_safe = ? LIMIT 1",
            vec![Value::from(safe.to_owned())],
        )
        .await
        .ok()
        .flatten()
        .map(user_from_row)
}

async fn set_privileges(state: &AppState, user_id: UserId, privileges: Privileges) {
    let _ = state
        .collaborators
        .db
        .execute(
            "UPDATE users SET privileges = ? WHERE id = ?",
            vec![Value::from(privileges.bits()), Value::from(user_id)],
        )
        .await;
}

/// Clears the `PUBLIC` bit, producing a restricted account without
/// disturbing any other privilege bit the caller's snapshot carries
/// (§4.7 "restrict-with-log").
async fn restrict_user(state: &AppState, user_id: UserId, privileges: Privileges) {
    let restricted = privileges - Privileges::PUBLIC;
    let _ = state
        .collaborators
        .db
        .execute(
            "UPDATE users SET privileges = ? WHERE id = ?",
            vec![Value::from(restricted.bits()), Value::from(user_id)],
        )
        .await;
}

async fn log_ban(state: &AppState, user_id: UserId, summary: &str) {
    let _ = state
        .collaborators
        .db
        .execute(
            "INSERT INTO ban_logs (userid, summary, time) VALUES (?, ?, UNIX_TIMESTAMP())",
            vec![Value::from(user_id), Value::from(summary.to_owned())],
        )
        .await;
}

/// Looks for another account sharing this hardware, tolerating the known
/// wine signatures (§4.7 step 5/7, `hwid::HardwareIds::is_wine`).
async fn find_conflicting_account(state: &AppState, hwid: &HardwareIds, exclude: UserId) -> Option<UserId> {
    let row = if hwid.is_wine() {
        state
            .collaborators
            .db
            .fetch_one(
                "SELECT userid FROM hw_user WHERE unique_id = ? AND userid != ? LIMIT 1",
                vec![Value::from(hwid.unique_id.clone()), Value::from(exclude)],
            )
            .await
    } else {
        state
            .collaborators
            .db
            .fetch_one(
                "SELECT userid FROM hw_user WHERE mac_hash = ? AND unique_id = ? AND disk_id = ? AND userid != ? LIMIT 1",
                vec![
                    Value::from(hwid.mac_hash.clone()),
                    Value::from(hwid.unique_id.clone()),
                    Value::from(hwid.disk_id.clone()),
                    Value::from(exclude),
                ],
            )
            .await
    };
    row.ok().flatten().and_then(|v| v.get("userid").and_then(JsonValue::as_i64)).map(|v| v as UserId)
}

async fn record_hardware(state: &AppState, user_id: UserId, hwid: &HardwareIds, ip: IpAddr) {
    let _ = state
        .collaborators
        .db
        .execute(
            "INSERT INTO hw_user (userid, mac, mac_hash, unique_id, disk_id, occurrences) VALUES (?, ?, ?, ?, ?, 1) \
             ON DUPLICATE KEY UPDATE occurrences = occurrences + 1",
            vec![
                Value::from(user_id),
                Value::from(hwid.mac_list.clone()),
                Value::from(hwid.mac_hash.clone()),
                Value::from(hwid.unique_id.clone()),
                Value::from(hwid.disk_id.clone()),
            ],
        )
        .await;
    let _ = state
        .collaborators
        .db
        .execute(
            "INSERT INTO ip_user (userid, ip) VALUES (?, ?) ON DUPLICATE KEY UPDATE ip = ip",
            vec![Value::from(user_id), Value::from(ip.to_string())],
        )
        .await;
}

pub(crate) async fn fetch_stats(state: &AppState, user_id: UserId) -> StatsState {
    let row = state
        .collaborators
        .db
        .fetch_one(
            "SELECT ranked_score, accuracy, playcount, total_score, pp_raw FROM users_stats \
             WHERE user_id = ? AND mode = 0 LIMIT 1",
            vec![Value::from(user_id)],
        )
        .await
        .ok()
        .flatten();

    let Some(row) = row else {
        return StatsState::default();
    };

    StatsState {
        ranked_score: row_i64(&row, "ranked_score"),
        accuracy: row.get("accuracy").and_then(JsonValue::as_f64).unwrap_or(0.0) as f32,
        playcount: row_i64(&row, "playcount") as i32,
        total_score: row_i64(&row, "total_score"),
        global_rank: 0,
        pp: row_i64(&row, "pp_raw").min(i16::MAX as i64) as i16,
    }
}

pub(crate) async fn global_rank(state: &AppState, safe_username: &str) -> i32 {
    match state.collaborators.cache.zrevrank("ripple:leaderboard:0", safe_username).await {
        Ok(Some(rank)) => rank as i32 + 1,
        _ => 0,
    }
}

async fn friend_ids(state: &AppState, user_id: UserId) -> Vec<i32> {
    state
        .collaborators
        .db
        .fetch_all(
            "SELECT user2 FROM users_relationships WHERE user1 = ?",
            vec![Value::from(user_id)],
        )
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|row| row.get("user2").and_then(JsonValue::as_i64))
        .map(|v| v as i32)
        .collect()
}

/// Outcome of a login attempt: `token` is `None` on any failure path, in
/// which case `body` carries whatever notification/failure marker was
/// queued (§4.7 "On any failure path").
pub struct LoginResult {
    pub token: Option<SessionId>,
    pub body: Bytes,
}

fn failure(packets: Vec<Bytes>) -> LoginResult {
    let mut out = BytesMut::new();
    for packet in packets {
        out.extend_from_slice(&packet);
    }
    LoginResult { token: None, body: out.freeze() }
}

fn denial(message: &str, banned: bool) -> LoginResult {
    failure(vec![
        builders::notification(message),
        if banned { builders::login_banned() } else { builders::login_failed() },
    ])
}

pub async fn login(state: &Arc<AppState>, body: &[u8], ip: IpAddr) -> LoginResult {
    let handshake = match parse_handshake(body) {
        Ok(handshake) => handshake,
        Err(_) => return failure(vec![builders::login_failed()]),
    };

    let safe = safe_username(&handshake.username);
    let Some(mut user) = find_user(state, &safe).await else {
        return denial("Incorrect username or password.", false);
    };

    if state.config.branding.maintenance && !user.privileges.is_admin() {
        return denial("The server is currently undergoing maintenance.", false);
    }

    if user.id == state.config.branding.bot_user_id {
        return denial("This account cannot be used to log in from a game client.", false);
    }

    if !hashing::verify_password(&handshake.password_md5, &user.password_hash) {
        return denial("Incorrect username or password.", false);
    }

    if user.privileges.is_banned() {
        return denial("Your account has been banned.", true);
    }

    if user.privileges.contains(Privileges::PENDING_VERIFICATION) {
        if let Some(hwid) = &handshake.hwid {
            if hwid.has_reliable_hashes() {
                if let Some(other_id) = find_conflicting_account(state, hwid, user.id).await {
                    restrict_user(state, other_id, Privileges::PUBLIC | Privileges::NORMAL).await;
                    log_ban(state, other_id, "restricted: multi-account hardware match").await;
                    set_privileges(state, user.id, Privileges::empty()).await;
                    log_ban(state, user.id, "banned: multi-account hardware match").await;
                    return denial("Multiple accounts detected on this hardware.", true);
                }
            }
        }
        user.privileges.remove(Privileges::PENDING_VERIFICATION);
        set_privileges(state, user.id, user.privileges).await;
    }

    let now = chrono::Utc::now().timestamp();
    let mut extra_notifications: Vec<String> = Vec::new();

    if user.frozen_until > 0 {
        if now < user.frozen_until {
            let days_left = (user.frozen_until - now) / 86_400;
            extra_notifications.push(format!(
                "Your account verification window expires in {days_left} day(s)."
            ));
        } else {
            restrict_user(state, user.id, user.privileges).await;
            user.privileges = user.privileges - Privileges::PUBLIC;
            log_ban(state, user.id, "restricted: verification window expired").await;
            return denial("Your account verification window has expired and has been restricted.", false);
        }
    }

    if is_cheat_client(&handshake.client_version, state.config.branding.minimum_client_year) {
        restrict_user(state, user.id, user.privileges).await;
        log_ban(state, user.id, "restricted: disallowed client version").await;
        return denial("Your client version is not allowed to connect.", false);
    }

    if let Some(hwid) = &handshake.hwid {
        if hwid.has_reliable_hashes() {
            record_hardware(state, user.id, hwid, ip).await;
        }
    }

    let geo = state.collaborators.geo.lookup(ip).await;
    let country_code = if user.country.eq_ignore_ascii_case("xx") || user.country.is_empty() {
        let code = std::str::from_utf8(&geo.country_code).unwrap_or("XX").to_owned();
        let _ = state
            .collaborators
            .db
            .execute("UPDATE users SET country = ? WHERE id = ?", vec![Value::from(code.clone()), Value::from(user.id)])
            .await;
        code
    } else {
        user.country.clone()
    };

    let tournament_client = handshake.client_version.to_ascii_lowercase().contains("tourney");
    let restricted = user.privileges.is_restricted();
    let admin = user.privileges.is_admin();

    let mut stats = fetch_stats(state, user.id).await;
    stats.global_rank = global_rank(state, &safe).await;

    let session = Arc::new(Session::new(
        Uuid::new_v4(),
        user.id,
        user.username.clone(),
        user.privileges.bits() as i32,
        country::code_to_byte(&country_code),
        handshake.utc_offset,
        geo.latitude,
        geo.longitude,
        tournament_client,
        stats,
        restricted,
        admin,
        user.silence_end,
    ));
    session.block_non_friend_dms.store(handshake.block_non_friend_dms, std::sync::atomic::Ordering::Release);

    state.sessions.insert(session.clone());

    session.enqueue(builders::silence_end_notify(session.silence_seconds_left(now).max(0) as u32));
    session.enqueue(builders::login_reply(user.id));
    session.enqueue(builders::protocol_version());
    session.enqueue(builders::bancho_priv(
        user.privileges.contains(Privileges::DONOR),
        user.privileges.contains(Privileges::BAT),
        user.privileges.contains(Privileges::TOURNAMENT_STAFF),
    ));
    session.enqueue(presence::presence_packet(&session));
    session.enqueue(presence::stats_packet(&session));
    session.enqueue(builders::channel_info_end());
    session.enqueue(builders::friend_list(&friend_ids(state, user.id).await));

    for channel in state.channels.public_non_hidden() {
        let member_count = state.streams.member_count(&channel.stream_name()) as u16;
        session.enqueue(builders::channel_info(&channel.name, &channel.description, member_count));
    }

    for channel in auto_join_channels(admin) {
        if let Some(channel) = state.channels.get(channel) {
            let _ = chat::join_channel(state, &session, &channel.name);
        } else {
            state.channels.ensure(Channel {
                name: channel.to_owned(),
                description: String::new(),
                public_read: true,
                public_write: true,
                hidden: false,
                auto_join: true,
                min_privilege: 0,
            });
            let _ = chat::join_channel(state, &session, channel);
        }
    }

    presence::announce_presence(state, &session);

    for other in state.sessions.all() {
        if other.id == session.id || other.is_restricted() {
            continue;
        }
        session.enqueue(presence::presence_packet(&other));
        session.enqueue(presence::stats_packet(&other));
    }

    if user.donor_expire > now {
        let days_left = (user.donor_expire - now) / 86_400;
        if (days_left as u32) <= state.config.branding.donor_expiry_warning_days {
            let expiry = chrono::DateTime::from_timestamp(user.donor_expire, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            extra_notifications.push(format!("Your supporter status expires on {expiry}."));
        }
    }

    for message in extra_notifications {
        session.enqueue(builders::notification(&message));
    }

    LoginResult { token: Some(session.id), body: session.fetch_queue() }
}

fn auto_join_channels(admin: bool) -> Vec<&'static str> {
    if admin {
        vec!["#osu", "#announce", "#admin"]
    } else {
        vec!["#osu", "#announce"]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_well_formed_handshake() {
        let body = b"test\npwmd5\nb20230101.1|0||01020304:aa:bb:cc:dd|0";
        let handshake = parse_handshake(body).unwrap();
        assert_eq!(handshake.username, "test");
        assert_eq!(handshake.password_md5, "pwmd5");
        assert_eq!(handshake.client_version, "b20230101.1");
        assert_eq!(handshake.utc_offset, 0);
        assert!(handshake.hwid.is_some());
        assert!(!handshake.block_non_friend_dms);
    }

    #[test]
    fn rejects_a_handshake_missing_a_section() {
        assert!(parse_handshake(b"test\npwmd5").is_err());
    }

    #[test]
    fn safe_username_lowercases_and_replaces_spaces() {
        assert_eq!(safe_username("Cool Guy"), "cool_guy");
    }

    #[test]
    fn non_b_prefixed_version_is_a_cheat_client() {
        assert!(is_cheat_client("osu!stream", 2018));
    }

    #[test]
    fn old_year_is_a_cheat_client() {
        assert!(is_cheat_client("b20100101.1", 2018));
    }

    #[test]
    fn recent_year_is_not_a_cheat_client() {
        assert!(!is_cheat_client("b20230101.1", 2018));
    }

    #[tokio::test]
    async fn unknown_user_returns_login_failed_with_no_token() {
        let state = Arc::new(crate::state::test_support::bare_state());
        let result = login(&state, b"nobody\npw\nb20230101.1|0||01020304:aa:bb:cc:dd|0", "127.0.0.1".parse().unwrap()).await;
        assert!(result.token.is_none());
        assert!(!result.body.is_empty());
    }
}
