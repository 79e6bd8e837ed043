//! Thin adapters to the systems this core deliberately does not own
//! (§1, §6.4): the relational store, the cache/bus, geo lookup, the PP
//! service, and the bot. Each is a small trait with exactly one
//! production implementation, so handlers depend on the trait rather
//! than a concrete client, matching the "explicit dependencies through a
//! context value" design note (§9).

pub mod bot;
pub mod cache;
pub mod db;
pub mod geo;
pub mod pp;

pub use bot::{Bot, BotReply, ScriptedBot, SilentBot};
pub use cache::{Cache, CacheBus};
pub use db::{RelationalStore, SeaOrmStore};
pub use geo::{GeoLocation, GeoLookup};
pub use pp::{PerformanceService, PpResult};

use std::sync::Arc;

/// Bundles every collaborator adapter behind one handle so handlers take a
/// single `Arc<Collaborators>` rather than five separate arguments.
pub struct Collaborators {
    pub db: Arc<dyn RelationalStore>,
    pub cache: Arc<dyn Cache>,
    pub geo: Arc<dyn GeoLookup>,
    pub pp: Arc<dyn PerformanceService>,
    pub bot: Arc<dyn Bot>,
}
