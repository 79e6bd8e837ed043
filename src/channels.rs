//! The chat channel layer (C4, §4.4): public channels loaded from the
//! relational store at startup, paired 1:1 with a `chat/{name}` stream.
//! Channels never disappear at runtime in the base protocol, so the
//! registry only grows (new channels are auto-created the first time a
//! private multiplayer/spectator channel is needed, e.g. `#multi_{id}`).

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::collaborators::RelationalStore;
use crate::error::CollaboratorError;
use crate::types::Map;

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub description: String,
    pub public_read: bool,
    pub public_write: bool,
    pub hidden: bool,
    pub auto_join: bool,
    /// Minimum bancho privilege bits required to read/write (0 = everyone).
    pub min_privilege: i32,
}

impl Channel {
    /// The paired stream name (§4.3 naming convention).
    pub fn stream_name(&self) -> String {
        format!("chat/{}", self.name)
    }

    fn auto(name: &str, description: &str, auto_join: bool) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            public_read: true,
            public_write: true,
            hidden: false,
            auto_join,
            min_privilege: 0,
        }
    }
}

/// Channels every install carries regardless of what the relational store
/// has seeded, so a fresh database still has somewhere for clients to land.
fn builtin_channels() -> Vec<Channel> {
    vec![
        Channel::auto("#osu", "Main channel", true),
        Channel::auto("#announce", "Staff announcements", true),
        Channel {
            name: "#admin".to_owned(),
            description: "Staff-only channel".to_owned(),
            public_read: false,
            public_write: true,
            hidden: true,
            auto_join: false,
            min_privilege: crate::privileges::ADMIN_PRIVILEGE_BIT,
        },
    ]
}

#[derive(Default)]
pub struct Channels {
    by_name: RwLock<Map<String, Channel>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads channel rows from the `chat_channels` table, falling back to
    /// (and always including) the builtin set. A missing table or empty
    /// result set is not an error: the builtins alone are enough to boot.
    pub async fn load(db: &dyn RelationalStore) -> Result<Self, CollaboratorError> {
        let channels = Self::new();
        for channel in builtin_channels() {
            channels.by_name.write().insert(channel.name.clone(), channel);
        }

        let rows = match db
            .fetch_all(
                "SELECT name, description, public_read, public_write, hidden, auto_join, min_privilege \
                 FROM chat_channels",
                Vec::new(),
            )
            .await
        {
            Ok(rows) => rows,
            Err(_) => return Ok(channels),
        };

        for row in rows {
            if let Some(channel) = channel_from_row(&row) {
                channels.by_name.write().insert(channel.name.clone(), channel);
            }
        }

        Ok(channels)
    }

    /// Re-reads `chat_channels` and upserts every row over the live table
    /// (§4.9 `reload_settings` bridge event): an operator editing a
    /// channel's privilege or description takes effect without a
    /// restart. Private per-match/spectator channels this registry
    /// created itself are untouched since they have no backing row.
    pub async fn reload(&self, db: &dyn RelationalStore) -> Result<(), CollaboratorError> {
        let rows = db
            .fetch_all(
                "SELECT name, description, public_read, public_write, hidden, auto_join, min_privilege \
                 FROM chat_channels",
                Vec::new(),
            )
            .await?;

        for row in rows {
            if let Some(channel) = channel_from_row(&row) {
                self.by_name.write().insert(channel.name.clone(), channel);
            }
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Channel> {
        self.by_name.read().get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.read().contains_key(name)
    }

    /// Registers a private channel on first use (multiplayer/spectator
    /// chat), idempotently.
    pub fn ensure(&self, channel: Channel) {
        self.by_name
            .write()
            .entry(channel.name.clone())
            .or_insert(channel);
    }

    pub fn remove(&self, name: &str) {
        self.by_name.write().remove(name);
    }

    pub fn public_non_hidden(&self) -> Vec<Channel> {
        self.by_name
            .read()
            .values()
            .filter(|c| c.public_read && !c.hidden)
            .cloned()
            .collect()
    }

    pub fn auto_join(&self) -> Vec<Channel> {
        self.by_name
            .read()
            .values()
            .filter(|c| c.auto_join)
            .cloned()
            .collect()
    }
}

fn channel_from_row(row: &JsonValue) -> Option<Channel> {
    Some(Channel {
        name: row.get("name")?.as_str()?.to_owned(),
        description: row.get("description").and_then(|v| v.as_str()).unwrap_or("").to_owned(),
        public_read: row.get("public_read").and_then(JsonValue::as_bool).unwrap_or(true),
        public_write: row.get("public_write").and_then(JsonValue::as_bool).unwrap_or(true),
        hidden: row.get("hidden").and_then(JsonValue::as_bool).unwrap_or(false),
        auto_join: row.get("auto_join").and_then(JsonValue::as_bool).unwrap_or(false),
        min_privilege: row
            .get("min_privilege")
            .and_then(JsonValue::as_i64)
            .unwrap_or(0) as i32,
    })
}

/// Builds the private per-match text channel name (§4.6 Creation).
pub fn match_channel_name(match_id: crate::types::MatchId) -> String {
    format!("#multi_{match_id}")
}

/// Builds the private per-spectator-host text channel name (§4.5 step 3).
pub fn spectator_channel_name(host_user_id: crate::types::UserId) -> String {
    format!("#spect_{host_user_id}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_channels_are_present_without_a_db_load() {
        let channels = Channels::new();
        for channel in builtin_channels() {
            channels.by_name.write().insert(channel.name.clone(), channel);
        }
        assert!(channels.exists("#osu"));
        assert!(channels.exists("#announce"));
        assert!(channels.exists("#admin"));
        assert_eq!(channels.public_non_hidden().len(), 2);
    }

    #[test]
    fn ensure_is_idempotent() {
        let channels = Channels::new();
        let name = match_channel_name(42);
        channels.ensure(Channel::auto(&name, "multiplayer lobby", false));
        channels.ensure(Channel::auto(&name, "multiplayer lobby", false));
        assert!(channels.exists(&name));
    }
}
