//! The process-wide context value threaded through every handler (§9
//! "Global state" design note): one session registry, one stream
//! registry, one channel registry, one match registry, one config
//! snapshot, one collaborator bundle. Handlers take `Extension<Arc<AppState>>`
//! rather than reaching for statics, so tests can build a hermetic
//! `AppState` with fake collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::channels::Channels;
use crate::collaborators::Collaborators;
use crate::config::Config;
use crate::multiplayer::Matches;
use crate::session::Sessions;
use crate::streams::Streams;

pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Sessions,
    pub streams: Streams,
    pub channels: Channels,
    pub matches: Matches,
    pub collaborators: Collaborators,
    /// Set once a scheduled restart begins counting down (§4.10); gates
    /// new logins the same way the upstream server's `restarting` flag did.
    pub restarting: AtomicBool,
}

impl AppState {
    pub fn new(config: Arc<Config>, channels: Channels, collaborators: Collaborators) -> Self {
        Self {
            config,
            sessions: Sessions::new(),
            streams: Streams::new(),
            channels,
            matches: Matches::new(),
            collaborators,
            restarting: AtomicBool::new(false),
        }
    }

    pub fn is_restarting(&self) -> bool {
        self.restarting.load(Ordering::Acquire)
    }
}

/// Fakes for building a hermetic `AppState` in unit tests, per this
/// module's "explicit dependencies" design note.
#[cfg(test)]
pub mod test_support {
    use std::sync::Arc;

    use axum::async_trait;
    use sea_orm::{JsonValue, Value};

    use super::AppState;
    use crate::collaborators::{Bot, BotReply, Cache, Collaborators, GeoLocation, GeoLookup, PerformanceService, PpResult, RelationalStore};
    use crate::config::Config;
    use crate::error::CollaboratorError;

    struct NullDb;

    #[async_trait]
    impl RelationalStore for NullDb {
        async fn execute(&self, _query: &str, _args: Vec<Value>) -> Result<u64, CollaboratorError> {
            Ok(0)
        }
        async fn fetch_one(&self, _query: &str, _args: Vec<Value>) -> Result<Option<JsonValue>, CollaboratorError> {
            Ok(None)
        }
        async fn fetch_all(&self, _query: &str, _args: Vec<Value>) -> Result<Vec<JsonValue>, CollaboratorError> {
            Ok(Vec::new())
        }
    }

    struct NullCache;

    #[async_trait]
    impl Cache for NullCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CollaboratorError> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), CollaboratorError> {
            Ok(())
        }
        async fn set_ex(&self, _key: &str, _value: &str, _seconds: u64) -> Result<(), CollaboratorError> {
            Ok(())
        }
        async fn del(&self, _key: &str) -> Result<(), CollaboratorError> {
            Ok(())
        }
        async fn zrevrank(&self, _key: &str, _member: &str) -> Result<Option<i64>, CollaboratorError> {
            Ok(None)
        }
        async fn sadd(&self, _key: &str, _member: &str) -> Result<(), CollaboratorError> {
            Ok(())
        }
        async fn srem(&self, _key: &str, _member: &str) -> Result<(), CollaboratorError> {
            Ok(())
        }
        async fn sismember(&self, _key: &str, _member: &str) -> Result<bool, CollaboratorError> {
            Ok(false)
        }
        async fn exists(&self, _key: &str) -> Result<bool, CollaboratorError> {
            Ok(false)
        }
        async fn publish(&self, _channel: &str, _payload: &str) -> Result<(), CollaboratorError> {
            Ok(())
        }
    }

    struct NullGeo;

    #[async_trait]
    impl GeoLookup for NullGeo {
        async fn lookup(&self, _ip: std::net::IpAddr) -> GeoLocation {
            GeoLocation::UNKNOWN
        }
    }

    struct NullPp;

    #[async_trait]
    impl PerformanceService for NullPp {
        async fn calculate(
            &self,
            _beatmap_id: i32,
            _mode: u8,
            _mods: i32,
            _max_combo: i32,
            _accuracy: f32,
            _miss_count: i32,
            _passed_objects: i32,
        ) -> PpResult {
            PpResult::default()
        }
    }

    struct NullBot;

    #[async_trait]
    impl Bot for NullBot {
        async fn respond(&self, _from_username: &str, _channel_or_user: &str, _message: &str) -> Option<BotReply> {
            None
        }
    }

    /// An `AppState` with default config, empty registries, and fake
    /// collaborators that satisfy every trait without touching any real
    /// external system.
    pub fn bare_state() -> AppState {
        let collaborators = Collaborators {
            db: Arc::new(NullDb),
            cache: Arc::new(NullCache),
            geo: Arc::new(NullGeo),
            pp: Arc::new(NullPp),
            bot: Arc::new(NullBot),
        };
        AppState::new(Arc::new(Config::for_tests()), crate::channels::Channels::new(), collaborators)
    }
}
