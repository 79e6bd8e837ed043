//! The multiplayer match engine (C6, §4.6): 16 fixed slots per match, a
//! closed slot-status enumeration, and host-gated settings mutation. Each
//! `Match` owns its own lock so one match's mutation never blocks another's,
//! mirroring the per-name locking already used by `Streams`.

pub mod codec;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::MatchLogicError;
use crate::types::{Map, MatchId, SlotIndex, UserId, MAX_SLOTS};

/// A slot's occupancy state, drawn from the closed enumeration in §3.
/// Numeric values match the upstream client's bitmask-shaped encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotStatus {
    Empty = 0,
    Open = 1,
    Locked = 2,
    NotReady = 4,
    Ready = 8,
    NoMap = 16,
    Playing = 32,
    Complete = 64,
    Quit = 128,
}

impl SlotStatus {
    /// §3 invariant: a slot has an occupant iff its status is one of these.
    pub fn has_player(self) -> bool {
        matches!(
            self,
            Self::NotReady | Self::Ready | Self::NoMap | Self::Playing | Self::Complete | Self::Quit
        )
    }

    pub fn is_playing_or_complete(self) -> bool {
        matches!(self, Self::Playing | Self::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Neutral,
    Red,
    Blue,
}

impl Team {
    fn toggled(self) -> Self {
        match self {
            Team::Blue => Team::Red,
            _ => Team::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScoringType {
    Score = 0,
    Accuracy = 1,
    Combo = 2,
    ScoreV2 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TeamType {
    HeadToHead = 0,
    TagCoop = 1,
    TeamVs = 2,
    TagTeamVs = 3,
}

impl TeamType {
    fn is_team_mode(self) -> bool {
        matches!(self, TeamType::TeamVs | TeamType::TagTeamVs)
    }
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub status: SlotStatus,
    pub team: Team,
    pub user_id: Option<UserId>,
    pub mods: i32,
    pub loaded: bool,
    pub skip: bool,
    pub completed: bool,
    pub failed: bool,
    pub score: i64,
    pub hp: u8,
}

impl Slot {
    fn open() -> Self {
        Self {
            status: SlotStatus::Open,
            team: Team::Neutral,
            user_id: None,
            mods: 0,
            loaded: false,
            skip: false,
            completed: false,
            failed: false,
            score: 0,
            hp: 0,
        }
    }

    fn reset_for_start(&mut self) {
        self.status = SlotStatus::Playing;
        self.loaded = false;
        self.skip = false;
        self.completed = false;
        self.failed = false;
        self.score = 0;
        self.hp = 0;
    }
}

/// A match's mutable state, behind a single per-match lock (§5). Built as a
/// struct rather than the registry's per-field locks used by `Session`,
/// since nearly every multiplayer operation touches several slots at once
/// and a match-wide lock is simpler to reason about than slot-level ones.
pub struct MatchState {
    pub id: MatchId,
    pub name: String,
    pub password: String,
    pub host_user_id: UserId,
    pub beatmap_id: i32,
    pub beatmap_name: String,
    pub beatmap_md5: String,
    pub game_mode: u8,
    pub mods: i32,
    pub scoring_type: ScoringType,
    pub team_type: TeamType,
    pub free_mods: bool,
    pub pp_competition: bool,
    pub in_progress: bool,
    pub slots: [Slot; MAX_SLOTS],
}

impl MatchState {
    fn occupied_slots(&self) -> impl Iterator<Item = (SlotIndex, &Slot)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.status.has_player())
    }

    fn slot_of(&self, user_id: UserId) -> Option<SlotIndex> {
        self.slots.iter().position(|s| s.user_id == Some(user_id))
    }

    fn lowest_open_slot(&self) -> Option<SlotIndex> {
        self.slots.iter().position(|s| s.status == SlotStatus::Open)
    }

    fn lowest_occupied_slot(&self) -> Option<SlotIndex> {
        self.occupied_slots().map(|(i, _)| i).next()
    }
}

pub struct Match {
    pub id: MatchId,
    state: Mutex<MatchState>,
}

impl Match {
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MatchState) -> R) -> R {
        f(&mut self.state.lock())
    }
}

/// Inputs used when creating a match (§4.6 Creation).
pub struct NewMatchArgs {
    pub name: String,
    pub password: String,
    pub beatmap_id: i32,
    pub beatmap_name: String,
    pub beatmap_md5: String,
    pub game_mode: u8,
    pub creator_user_id: UserId,
}

/// Owns every live match, indexed by the smallest-unused 16-bit id.
#[derive(Default)]
pub struct Matches {
    by_id: RwLock<Map<MatchId, Arc<Match>>>,
}

impl Matches {
    pub fn new() -> Self {
        Self::default()
    }

    fn smallest_unused_id(&self) -> MatchId {
        let existing = self.by_id.read();
        let mut candidate: MatchId = 1;
        while existing.contains_key(&candidate) {
            candidate = candidate.wrapping_add(1);
        }
        candidate
    }

    /// Creates a match, seats the creator in slot 0, and registers it.
    /// The caller is responsible for the lobby broadcast, stream joins, and
    /// channel welcome messages (§4.6 Creation) since those need registries
    /// this type doesn't own.
    pub fn create(&self, args: NewMatchArgs) -> Arc<Match> {
        let id = self.smallest_unused_id();
        let mut slots: [Slot; MAX_SLOTS] = std::array::from_fn(|_| Slot::open());
        slots[0] = Slot {
            status: SlotStatus::NotReady,
            user_id: Some(args.creator_user_id),
            ..Slot::open()
        };

        let state = MatchState {
            id,
            name: args.name,
            password: args.password,
            host_user_id: args.creator_user_id,
            beatmap_id: args.beatmap_id,
            beatmap_name: args.beatmap_name,
            beatmap_md5: args.beatmap_md5,
            game_mode: args.game_mode,
            mods: 0,
            scoring_type: ScoringType::Score,
            team_type: TeamType::HeadToHead,
            free_mods: false,
            pp_competition: true,
            in_progress: false,
            slots,
        };

        let m = Arc::new(Match { id, state: Mutex::new(state) });
        self.by_id.write().insert(id, m.clone());
        m
    }

    pub fn by_id(&self, id: MatchId) -> Option<Arc<Match>> {
        self.by_id.read().get(&id).cloned()
    }

    pub fn remove(&self, id: MatchId) {
        self.by_id.write().remove(&id);
    }

    pub fn all(&self) -> Vec<Arc<Match>> {
        self.by_id.read().values().cloned().collect()
    }
}

/// Outcome of a successful join (§4.6 Join).
pub struct JoinOutcome {
    pub slot: SlotIndex,
}

/// Looks up which slot (if any) a user currently occupies in `m`. Exposed
/// for callers that only have a user id and need the slot index some
/// operations (e.g. transfer-host) key off of.
pub fn slot_of(m: &Match, user_id: UserId) -> Option<SlotIndex> {
    m.with_state(|state| state.slot_of(user_id))
}

/// Joins `user_id` into the lowest-indexed open slot, validating the
/// password. Never mutates state on any rejection path (§7).
pub fn join(m: &Match, password: &str, user_id: UserId) -> Result<JoinOutcome, MatchLogicError> {
    m.with_state(|state| {
        if !state.password.is_empty() && state.password != password {
            return Err(MatchLogicError::WrongPassword);
        }
        let slot = state.lowest_open_slot().ok_or(MatchLogicError::SlotNotOpen)?;
        state.slots[slot] = Slot {
            status: SlotStatus::NotReady,
            user_id: Some(user_id),
            ..Slot::open()
        };
        Ok(JoinOutcome { slot })
    })
}

/// Outcome of a leave: whether the match still has any occupant left.
pub struct LeaveOutcome {
    pub disposed: bool,
    pub new_host: Option<UserId>,
}

pub fn leave(m: &Match, user_id: UserId) -> LeaveOutcome {
    m.with_state(|state| {
        let Some(slot) = state.slot_of(user_id) else {
            return LeaveOutcome { disposed: false, new_host: None };
        };
        state.slots[slot] = Slot::open();

        let was_host = state.host_user_id == user_id;
        let remaining_host = state.lowest_occupied_slot().and_then(|i| state.slots[i].user_id);

        match remaining_host {
            None => LeaveOutcome { disposed: true, new_host: None },
            Some(candidate) => {
                if was_host {
                    state.host_user_id = candidate;
                    LeaveOutcome { disposed: false, new_host: Some(candidate) }
                } else {
                    LeaveOutcome { disposed: false, new_host: None }
                }
            }
        }
    })
}

pub fn change_slot(m: &Match, user_id: UserId, target: SlotIndex) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        let current = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        if target >= MAX_SLOTS || state.slots[target].status != SlotStatus::Open {
            return Err(MatchLogicError::SlotNotOpen);
        }
        state.slots.swap(current, target);
        Ok(())
    })
}

pub fn toggle_lock(m: &Match, host_user_id: UserId, target: SlotIndex) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        if target >= MAX_SLOTS {
            return Err(MatchLogicError::SlotNotOpen);
        }
        let slot = &mut state.slots[target];
        if slot.status.has_player() {
            return Err(MatchLogicError::SlotNotOpen);
        }
        slot.status = match slot.status {
            SlotStatus::Locked => SlotStatus::Open,
            _ => SlotStatus::Locked,
        };
        Ok(())
    })
}

pub fn change_team(m: &Match, user_id: UserId) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].team = state.slots[slot].team.toggled();
        Ok(())
    })
}

pub fn change_mods(m: &Match, user_id: UserId, mods: i32) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        if state.free_mods {
            let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
            state.slots[slot].mods = mods;
        } else {
            require_host(state, user_id)?;
            state.mods = mods;
        }
        Ok(())
    })
}

/// Host-only settings change (§4.6 Slot actions, Change-settings).
pub struct SettingsChange {
    pub name: String,
    pub password: String,
    pub beatmap_id: i32,
    pub beatmap_name: String,
    pub beatmap_md5: String,
    pub game_mode: u8,
    pub scoring_type: ScoringType,
    pub team_type: TeamType,
    pub free_mods: bool,
}

pub fn change_settings(m: &Match, host_user_id: UserId, change: SettingsChange) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        let turned_on_free_mods = change.free_mods && !state.free_mods;

        state.name = change.name;
        state.password = change.password;
        state.beatmap_id = change.beatmap_id;
        state.beatmap_name = change.beatmap_name;
        state.beatmap_md5 = change.beatmap_md5;
        state.game_mode = change.game_mode;
        state.scoring_type = change.scoring_type;
        state.team_type = change.team_type;
        state.free_mods = change.free_mods;

        if turned_on_free_mods {
            let global_mods = state.mods;
            for slot in state.slots.iter_mut().filter(|s| s.status.has_player()) {
                slot.mods = global_mods;
            }
        }
        Ok(())
    })
}

pub fn change_password(m: &Match, host_user_id: UserId, password: String) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        state.password = password;
        Ok(())
    })
}

/// §4.6 Slot actions, Transfer-host. `target` is a slot index — the client
/// sends the slot the new host occupies, not a user id.
pub fn transfer_host(m: &Match, host_user_id: UserId, target: SlotIndex) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        if target >= MAX_SLOTS || !state.slots[target].status.has_player() {
            return Err(MatchLogicError::InvalidHostTarget);
        }
        state.host_user_id = state.slots[target].user_id.expect("has_player implies user_id");
        Ok(())
    })
}

#[derive(Debug, Clone, Copy)]
pub enum ReadyState {
    Ready,
    NotReady,
    NoMap,
}

pub fn set_ready_state(m: &Match, user_id: UserId, ready_state: ReadyState) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].status = match ready_state {
            ReadyState::Ready => SlotStatus::Ready,
            ReadyState::NotReady => SlotStatus::NotReady,
            ReadyState::NoMap => SlotStatus::NoMap,
        };
        Ok(())
    })
}

/// Transitions every ready/not-ready occupant to playing (§4.6 Start).
/// Returns the user ids that are now playing.
pub fn start(m: &Match, host_user_id: UserId) -> Result<Vec<UserId>, MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        state.in_progress = true;
        let mut playing = Vec::new();
        for slot in state.slots.iter_mut() {
            if matches!(slot.status, SlotStatus::Ready | SlotStatus::NotReady) {
                slot.reset_for_start();
                playing.push(slot.user_id.expect("has_player implies user_id"));
            }
        }
        Ok(playing)
    })
}

/// Host-requested early stop of an in-progress match: every playing slot
/// reverts to not-ready, mirroring the normal all-complete transition in
/// [`mark_completed`] without requiring anyone to actually finish.
pub fn abort(m: &Match, host_user_id: UserId) -> Result<(), MatchLogicError> {
    m.with_state(|state| {
        require_host(state, host_user_id)?;
        for slot in state.slots.iter_mut() {
            if slot.status.is_playing_or_complete() {
                slot.status = SlotStatus::NotReady;
            }
        }
        state.in_progress = false;
        Ok(())
    })
}

/// One score-update frame, after the server-assigned slot index is known
/// (§4.6 Per-frame updates). The client-supplied slot id is discarded.
pub struct ScoreFrame {
    pub time: i32,
    pub count_300: u16,
    pub count_100: u16,
    pub count_50: u16,
    pub count_geki: u16,
    pub count_katu: u16,
    pub count_miss: u16,
    pub total_score: i32,
    pub max_combo: u16,
    pub current_combo: u16,
    pub perfect: bool,
    pub current_hp: u8,
    pub tag_byte: u8,
    pub using_score_v2: bool,
}

/// Prepared inputs for a PP-competition recalculation, returned so the
/// caller can await the PP collaborator without holding the match lock.
pub struct PendingPpLookup {
    pub slot: SlotIndex,
    pub beatmap_id: i32,
    pub game_mode: u8,
    pub mods: i32,
    pub max_combo: u16,
    pub accuracy: f32,
    pub miss_count: u16,
    pub passed_objects: u32,
}

/// Standard-mode accuracy (§4.6.1), clamped to `[0,1]` and returned as a
/// percentage in `[0,100]`.
pub fn standard_accuracy(c300: u16, c100: u16, c50: u16, c_miss: u16) -> f32 {
    let denominator = (c_miss as u32 + c50 as u32 + c100 as u32 + c300 as u32) * 300;
    if denominator == 0 {
        return 100.0;
    }
    let numerator = c50 as u32 * 50 + c100 as u32 * 100 + c300 as u32 * 300;
    (numerator as f32 / denominator as f32).clamp(0.0, 1.0) * 100.0
}

/// Applies a frame's hit counts to the sender's slot score/hp and, if the
/// match runs PP-competition scoring, returns the PP lookup the caller must
/// resolve asynchronously before calling [`finish_score_update`].
pub fn apply_score_update(
    m: &Match,
    user_id: UserId,
    frame: &ScoreFrame,
) -> Result<(SlotIndex, Option<PendingPpLookup>), MatchLogicError> {
    m.with_state(|state| {
        let slot_index = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        let match_mods = state.mods;
        let slot = &mut state.slots[slot_index];
        slot.score = frame.total_score as i64;
        slot.hp = frame.current_hp;

        if !state.pp_competition {
            return Ok((slot_index, None));
        }

        let accuracy = standard_accuracy(frame.count_300, frame.count_100, frame.count_50, frame.count_miss);
        let passed_objects =
            frame.count_300 as u32 + frame.count_100 as u32 + frame.count_50 as u32 + frame.count_miss as u32;

        Ok((
            slot_index,
            Some(PendingPpLookup {
                slot: slot_index,
                beatmap_id: state.beatmap_id,
                game_mode: state.game_mode,
                mods: slot.mods | match_mods,
                max_combo: frame.max_combo,
                accuracy,
                miss_count: frame.count_miss,
                passed_objects,
            }),
        ))
    })
}

/// Writes back a resolved PP value (rounded) into the slot's score, replacing
/// the client-reported total score (§4.6 Per-frame updates).
pub fn apply_pp_result(m: &Match, slot: SlotIndex, pp: i32) {
    m.with_state(|state| {
        state.slots[slot].score = pp as i64;
    });
}

pub fn mark_loaded(m: &Match, user_id: UserId) -> Result<bool, MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].loaded = true;
        let all_loaded = state
            .slots
            .iter()
            .filter(|s| s.status.is_playing_or_complete())
            .all(|s| s.loaded);
        Ok(all_loaded)
    })
}

/// Outcome of a skip request: whether every playing slot has now skipped.
pub fn request_skip(m: &Match, user_id: UserId) -> Result<bool, MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].skip = true;
        let all_skipped = state
            .slots
            .iter()
            .filter(|s| s.status.is_playing_or_complete())
            .all(|s| s.skip);
        Ok(all_skipped)
    })
}

pub fn mark_failed(m: &Match, user_id: UserId) -> Result<SlotIndex, MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].failed = true;
        Ok(slot)
    })
}

/// Outcome of a completion report: whether the whole match is now complete
/// (§4.6 Completion), scoring-type dependent.
pub fn mark_completed(m: &Match, user_id: UserId) -> Result<bool, MatchLogicError> {
    m.with_state(|state| {
        let slot = state.slot_of(user_id).ok_or(MatchLogicError::NoSuchMatch)?;
        state.slots[slot].completed = true;

        let playing: Vec<&Slot> = state.slots.iter().filter(|s| s.status.is_playing_or_complete()).collect();
        let all_done = if state.team_type.is_team_mode() {
            playing.iter().all(|s| s.completed || (s.failed && s.hp == 0))
        } else {
            playing
                .iter()
                .all(|s| s.status == SlotStatus::Quit || s.completed)
        };

        if all_done {
            for slot in state.slots.iter_mut() {
                if slot.status.is_playing_or_complete() && slot.status != SlotStatus::Quit {
                    slot.status = SlotStatus::NotReady;
                }
            }
            state.in_progress = false;
        }
        Ok(all_done)
    })
}

fn require_host(state: &MatchState, user_id: UserId) -> Result<(), MatchLogicError> {
    if state.host_user_id != user_id {
        return Err(MatchLogicError::NotHost);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn new_match(matches: &Matches, creator: UserId) -> Arc<Match> {
        matches.create(NewMatchArgs {
            name: "test match".to_owned(),
            password: String::new(),
            beatmap_id: 1,
            beatmap_name: "song".to_owned(),
            beatmap_md5: "abc".to_owned(),
            game_mode: 0,
            creator_user_id: creator,
        })
    }

    #[test]
    fn create_seats_creator_in_slot_zero_as_host() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        m.with_state(|state| {
            assert_eq!(state.slots[0].user_id, Some(1));
            assert_eq!(state.host_user_id, 1);
        });
    }

    #[test]
    fn join_rejects_wrong_password() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        m.with_state(|state| state.password = "secret".to_owned());
        let err = join(&m, "nope", 2).unwrap_err();
        assert!(matches!(err, MatchLogicError::WrongPassword));
    }

    #[test]
    fn join_places_in_lowest_open_slot() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        let outcome = join(&m, "", 2).unwrap();
        assert_eq!(outcome.slot, 1);
    }

    #[test]
    fn leave_reassigns_host_to_lowest_occupied_slot() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        let outcome = leave(&m, 1);
        assert!(!outcome.disposed);
        assert_eq!(outcome.new_host, Some(2));
    }

    #[test]
    fn leave_last_occupant_disposes_match() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        let outcome = leave(&m, 1);
        assert!(outcome.disposed);
    }

    #[test]
    fn non_host_cannot_change_settings() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        let err = change_settings(
            &m,
            2,
            SettingsChange {
                name: "new name".to_owned(),
                password: String::new(),
                beatmap_id: 2,
                beatmap_name: "other".to_owned(),
                beatmap_md5: "def".to_owned(),
                game_mode: 0,
                scoring_type: ScoringType::Score,
                team_type: TeamType::HeadToHead,
                free_mods: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, MatchLogicError::NotHost));
    }

    #[test]
    fn start_moves_ready_and_not_ready_slots_to_playing() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        set_ready_state(&m, 2, ReadyState::Ready).unwrap();
        let playing = start(&m, 1).unwrap();
        assert_eq!(playing.len(), 2);
        m.with_state(|state| {
            assert_eq!(state.slots[0].status, SlotStatus::Playing);
            assert_eq!(state.slots[1].status, SlotStatus::Playing);
        });
    }

    #[test]
    fn standard_accuracy_is_100_percent_for_all_300s() {
        let acc = standard_accuracy(100, 0, 0, 0);
        assert!((acc - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn standard_accuracy_accounts_for_misses() {
        let acc = standard_accuracy(0, 0, 0, 10);
        assert_eq!(acc, 0.0);
    }

    #[test]
    fn completion_requires_every_playing_slot_in_head_to_head() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        start(&m, 1).unwrap();

        let all_done = mark_completed(&m, 1).unwrap();
        assert!(!all_done);
        let all_done = mark_completed(&m, 2).unwrap();
        assert!(all_done);
        m.with_state(|state| assert!(!state.in_progress));
    }

    #[test]
    fn abort_reverts_playing_slots_to_not_ready() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        start(&m, 1).unwrap();

        abort(&m, 1).unwrap();
        m.with_state(|state| {
            assert!(!state.in_progress);
            assert_eq!(state.slots[0].status, SlotStatus::NotReady);
            assert_eq!(state.slots[1].status, SlotStatus::NotReady);
        });
    }

    #[test]
    fn abort_rejects_non_host() {
        let matches = Matches::new();
        let m = new_match(&matches, 1);
        join(&m, "", 2).unwrap();
        start(&m, 1).unwrap();

        let err = abort(&m, 2).unwrap_err();
        assert!(matches!(err, MatchLogicError::NotHost));
    }
}
