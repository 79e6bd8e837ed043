//! Sessions are a logged-in client's server-side record (§3, §4.2): the
//! session registry owns them; streams and channels only ever hold a
//! session id, never a strong reference, so destruction is always a
//! single point of truth (the registry's `delete`).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU32, Ordering};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use parking_lot::{Mutex, RwLock};

use crate::types::{Map, MatchId, SessionId, UserId};

pub mod action;

pub use action::ActionState;

/// A closed record for a session's broadcast stats (§9 "duck-typed score
/// object" design note), used to answer `userStats` requests and to seed
/// the welcome sequence.
#[derive(Debug, Clone, Default)]
pub struct StatsState {
    pub ranked_score: i64,
    pub accuracy: f32,
    pub playcount: i32,
    pub total_score: i64,
    pub global_rank: i32,
    pub pp: i16,
}

pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub privileges: AtomicI32,
    pub country: u8,
    pub utc_offset: i8,
    pub latitude: f32,
    pub longitude: f32,
    pub tournament_client: bool,

    pub action: Mutex<ActionState>,
    pub stats: Mutex<StatsState>,
    pub joined_channels: Mutex<HashSet<String>>,
    pub spectating: Mutex<Option<UserId>>,
    pub match_id: Mutex<Option<MatchId>>,
    pub away_message: Mutex<Option<String>>,
    pub block_non_friend_dms: AtomicBool,

    queue: Mutex<BytesMut>,
    last_activity: Mutex<Instant>,

    pub restricted: AtomicBool,
    pub admin: AtomicBool,
    pub spam_counter: AtomicU32,
    pub kicked: AtomicBool,

    /// Unix timestamp (seconds) the current silence expires at, 0 if not
    /// silenced (§4.4 spam enforcement, §4.9 `silence` bridge event).
    pub silence_end: AtomicI64,

    /// Serializes concurrent HTTP requests for this session (§4.2). Held
    /// across handler execution, including any collaborator awaits, so
    /// it must never be taken while holding another session's lock of
    /// any kind (§5 critical-section discipline).
    pub processing: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn new(
        id: SessionId,
        user_id: UserId,
        username: String,
        privileges: i32,
        country: u8,
        utc_offset: i8,
        latitude: f32,
        longitude: f32,
        tournament_client: bool,
        stats: StatsState,
        restricted: bool,
        admin: bool,
        silence_end: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            username,
            privileges: AtomicI32::new(privileges),
            country,
            utc_offset,
            latitude,
            longitude,
            tournament_client,
            action: Mutex::new(ActionState::default()),
            stats: Mutex::new(stats),
            joined_channels: Mutex::new(HashSet::new()),
            spectating: Mutex::new(None),
            match_id: Mutex::new(None),
            away_message: Mutex::new(None),
            block_non_friend_dms: AtomicBool::new(false),
            queue: Mutex::new(BytesMut::new()),
            last_activity: Mutex::new(Instant::now()),
            restricted: AtomicBool::new(restricted),
            admin: AtomicBool::new(admin),
            spam_counter: AtomicU32::new(0),
            kicked: AtomicBool::new(false),
            silence_end: AtomicI64::new(silence_end),
            processing: tokio::sync::Mutex::new(()),
        }
    }

    /// Appends bytes to the outbound queue, preserving enqueue order (§4.2).
    pub fn enqueue(&self, bytes: Bytes) {
        self.queue.lock().extend_from_slice(&bytes);
    }

    /// Atomically drains and resets the outbound queue (§8 property 8).
    pub fn fetch_queue(&self) -> Bytes {
        std::mem::take(&mut *self.queue.lock()).freeze()
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> std::time::Duration {
        self.last_activity.lock().elapsed()
    }

    pub fn kick(&self) {
        self.kicked.store(true, Ordering::Release);
    }

    pub fn is_kicked(&self) -> bool {
        self.kicked.load(Ordering::Acquire)
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted.load(Ordering::Acquire)
    }

    /// Seconds remaining on the current silence, 0 if not silenced (§4.4,
    /// §4.7 welcome sequence `silence-end-notify`).
    pub fn silence_seconds_left(&self, now: i64) -> i32 {
        let until = self.silence_end.load(Ordering::Acquire);
        (until - now).max(0) as i32
    }

    pub fn is_silenced(&self, now: i64) -> bool {
        self.silence_end.load(Ordering::Acquire) > now
    }

    pub fn privileges(&self) -> i32 {
        self.privileges.load(Ordering::Acquire)
    }

    /// Overwrites the live privilege bitmask and the `restricted`/`admin`
    /// flags derived from it (§4.9 `refresh_privs` bridge event):
    /// privilege changes made elsewhere take effect on an already
    /// logged-in session without forcing a reconnect.
    pub fn set_privileges(&self, privileges: i32) {
        let parsed = crate::privileges::Privileges::from_bits_truncate(privileges as i64);
        self.privileges.store(privileges, Ordering::Release);
        self.restricted.store(parsed.is_restricted(), Ordering::Release);
        self.admin.store(parsed.is_admin(), Ordering::Release);
    }
}

/// Owns every live session, indexed by session id and (for the single
/// non-tournament session per user, §3 invariant) by user id.
pub struct Sessions {
    by_id: RwLock<Map<SessionId, std::sync::Arc<Session>>>,
    primary_by_user: RwLock<Map<UserId, SessionId>>,
}

impl Default for Sessions {
    fn default() -> Self {
        Self {
            by_id: RwLock::new(Map::new()),
            primary_by_user: RwLock::new(Map::new()),
        }
    }
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `session`, evicting and returning any pre-existing
    /// non-tournament session owned by the same user (§4.2 eviction).
    pub fn insert(&self, session: std::sync::Arc<Session>) -> Option<std::sync::Arc<Session>> {
        let id = session.id;
        let user_id = session.user_id;
        let tournament = session.tournament_client;

        self.by_id.write().insert(id, session);

        if tournament {
            return None;
        }

        let evicted_id = self.primary_by_user.write().insert(user_id, id);
        evicted_id.and_then(|evicted_id| self.by_id.read().get(&evicted_id).cloned())
    }

    pub fn by_id(&self, id: &SessionId) -> Option<std::sync::Arc<Session>> {
        self.by_id.read().get(id).cloned()
    }

    pub fn by_user_id(&self, user_id: UserId) -> Option<std::sync::Arc<Session>> {
        let id = *self.primary_by_user.read().get(&user_id)?;
        self.by_id(&id)
    }

    /// Linear lookup by username, case-insensitively (osu! usernames are
    /// unique modulo case/whitespace, §3). Used to resolve private-message
    /// and `!mp` targets named by display string rather than user id.
    pub fn by_username(&self, username: &str) -> Option<std::sync::Arc<Session>> {
        self.by_id
            .read()
            .values()
            .find(|session| session.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    /// Removes a session from both indices. Callers are responsible for
    /// also removing it from any stream/channel it had joined.
    pub fn remove(&self, id: &SessionId) -> Option<std::sync::Arc<Session>> {
        let session = self.by_id.write().remove(id)?;
        if !session.tournament_client {
            let mut primary = self.primary_by_user.write();
            if primary.get(&session.user_id) == Some(id) {
                primary.remove(&session.user_id);
            }
        }
        Some(session)
    }

    pub fn all(&self) -> Vec<std::sync::Arc<Session>> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn make_session(id: SessionId, user_id: UserId, tournament: bool) -> std::sync::Arc<Session> {
        std::sync::Arc::new(Session::new(
            id,
            user_id,
            format!("user{user_id}"),
            1,
            0,
            0,
            0.0,
            0.0,
            tournament,
            StatsState::default(),
            false,
            false,
            0,
        ))
    }

    #[test]
    fn queue_preserves_enqueue_order() {
        let session = make_session(SessionId::new_v4(), 1, false);
        session.enqueue(Bytes::from_static(b"abc"));
        session.enqueue(Bytes::from_static(b"def"));
        assert_eq!(&session.fetch_queue()[..], b"abcdef");
        assert!(session.fetch_queue().is_empty());
    }

    #[test]
    fn login_for_same_user_evicts_previous_non_tournament_session() {
        let sessions = Sessions::new();
        let first = make_session(SessionId::new_v4(), 42, false);
        let first_id = first.id;
        sessions.insert(first);

        let second = make_session(SessionId::new_v4(), 42, false);
        let evicted = sessions.insert(second.clone());

        assert_eq!(evicted.unwrap().id, first_id);
        assert_eq!(sessions.by_user_id(42).unwrap().id, second.id);
    }

    #[test]
    fn tournament_sessions_do_not_evict_or_register_as_primary() {
        let sessions = Sessions::new();
        let primary = make_session(SessionId::new_v4(), 7, false);
        sessions.insert(primary.clone());

        let tourney = make_session(SessionId::new_v4(), 7, true);
        let evicted = sessions.insert(tourney.clone());

        assert!(evicted.is_none());
        assert_eq!(sessions.by_user_id(7).unwrap().id, primary.id);
        assert!(sessions.by_id(&tourney.id).is_some());
    }
}
