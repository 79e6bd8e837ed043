//! Type aliases that help identify field meaning at call sites, the way
//! the source's flat `u32`-everywhere id scheme never did.

use hashbrown::HashMap;

/// The database's numeric user id.
pub type UserId = i32;

/// A session's opaque 128-bit token, rendered as a UUID string.
pub type SessionId = uuid::Uuid;

/// A multiplayer match's 16-bit id.
pub type MatchId = u16;

/// Index into a match's 16 fixed slots.
pub type SlotIndex = usize;

pub const MAX_SLOTS: usize = 16;

/// A plain `HashMap` from the const-friendly `hashbrown` crate, matching
/// the registry-table style used throughout the session/stream/match
/// registries.
pub type Map<K, V> = HashMap<K, V>;
