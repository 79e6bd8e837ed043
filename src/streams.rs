//! The publish/subscribe stream fabric (C3, §4.3): named fanout sets of
//! session ids. Reserved names: `main`, `lobby`, `chat/{name}`,
//! `spect/{hostUserId}`, `multi/{matchId}`, `multi/{matchId}/playing`.
//!
//! Grounded on the same registry shape used for matches: a top-level lock
//! guards the name→set table, while each named set gets its own lock so a
//! broadcast on one stream never blocks membership changes on another.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::session::Sessions;
use crate::types::{Map, SessionId};

type MemberSet = Arc<RwLock<HashSet<SessionId>>>;

#[derive(Default)]
pub struct Streams {
    streams: RwLock<Map<String, MemberSet>>,
}

impl Streams {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create(&self, name: &str) -> MemberSet {
        if let Some(existing) = self.streams.read().get(name) {
            return existing.clone();
        }
        self.streams
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(RwLock::new(HashSet::new())))
            .clone()
    }

    pub fn join(&self, name: &str, session: SessionId) {
        self.get_or_create(name).write().insert(session);
    }

    /// Removes `session` from the named stream. Leaves an empty stream in
    /// place rather than deleting it, since reserved streams like `main`
    /// and `lobby` are expected to go empty and refill.
    pub fn leave(&self, name: &str, session: SessionId) {
        if let Some(set) = self.streams.read().get(name) {
            set.write().remove(&session);
        }
    }

    pub fn members(&self, name: &str) -> Vec<SessionId> {
        match self.streams.read().get(name) {
            Some(set) => set.read().iter().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn member_count(&self, name: &str) -> usize {
        match self.streams.read().get(name) {
            Some(set) => set.read().len(),
            None => 0,
        }
    }

    pub fn contains(&self, name: &str, session: SessionId) -> bool {
        match self.streams.read().get(name) {
            Some(set) => set.read().contains(&session),
            None => false,
        }
    }

    /// Enqueues `bytes` on every current member of `name` except
    /// `exclude`, taking a single snapshot of the member set so a
    /// concurrent join/leave never sees a torn broadcast (§4.3).
    pub fn broadcast(
        &self,
        sessions: &Sessions,
        name: &str,
        bytes: Bytes,
        exclude: Option<SessionId>,
    ) {
        let members = self.members(name);
        for member in members {
            if Some(member) == exclude {
                continue;
            }
            if let Some(session) = sessions.by_id(&member) {
                session.enqueue(bytes.clone());
            }
        }
    }

    /// Drops a named stream entirely (match disposal, §4.6 Leave).
    pub fn remove_stream(&self, name: &str) {
        self.streams.write().remove(name);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::{Session, StatsState};

    fn make_session(sessions: &Sessions, user_id: i32) -> SessionId {
        let id = SessionId::new_v4();
        let session = std::sync::Arc::new(Session::new(
            id,
            user_id,
            format!("user{user_id}"),
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
        ));
        sessions.insert(session);
        id
    }

    #[test]
    fn broadcast_reaches_every_member_except_excluded() {
        let sessions = Sessions::new();
        let streams = Streams::new();

        let a = make_session(&sessions, 1);
        let b = make_session(&sessions, 2);
        let c = make_session(&sessions, 3);

        streams.join("chat/#osu", a);
        streams.join("chat/#osu", b);
        streams.join("chat/#osu", c);

        streams.broadcast(&sessions, "chat/#osu", Bytes::from_static(b"hi"), Some(a));

        assert!(sessions.by_id(&a).unwrap().fetch_queue().is_empty());
        assert_eq!(&sessions.by_id(&b).unwrap().fetch_queue()[..], b"hi");
        assert_eq!(&sessions.by_id(&c).unwrap().fetch_queue()[..], b"hi");
    }

    #[test]
    fn leave_removes_future_but_not_past_broadcasts() {
        let sessions = Sessions::new();
        let streams = Streams::new();
        let a = make_session(&sessions, 1);

        streams.join("main", a);
        streams.broadcast(&sessions, "main", Bytes::from_static(b"one"), None);
        streams.leave("main", a);
        streams.broadcast(&sessions, "main", Bytes::from_static(b"two"), None);

        assert_eq!(&sessions.by_id(&a).unwrap().fetch_queue()[..], b"one");
    }
}
