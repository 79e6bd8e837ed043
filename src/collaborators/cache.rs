//! Cache/bus collaborator (§6.4): key-value, sorted-set, set, and pub/sub
//! operations against the external Redis instance, namespaced under
//! `ripple:*` and `peppy:*` (§6.5). No repo in the retrieval pack talks to
//! Redis directly; this is the standard ecosystem crate for the job.

use axum::async_trait;
use futures_util::StreamExt;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::error::CollaboratorError;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), CollaboratorError>;
    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), CollaboratorError>;
    async fn del(&self, key: &str) -> Result<(), CollaboratorError>;
    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<i64>, CollaboratorError>;
    async fn sadd(&self, key: &str, member: &str) -> Result<(), CollaboratorError>;
    async fn srem(&self, key: &str, member: &str) -> Result<(), CollaboratorError>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CollaboratorError>;
    async fn exists(&self, key: &str) -> Result<bool, CollaboratorError>;
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), CollaboratorError>;
}

/// Channels the pub/sub bridge (C9) subscribes to.
pub const SUBSCRIBED_CHANNELS: &[&str] = &[
    "disconnect",
    "reload_settings",
    "update_cached_stats",
    "silence",
    "ban",
    "notification",
    "refresh_privs",
    "bot_msg",
];

pub struct CacheBus {
    client: Client,
    manager: ConnectionManager,
}

impl CacheBus {
    pub async fn connect(config: &crate::config::RedisConfig) -> Result<Self, CollaboratorError> {
        let client = Client::open(config.connection_string())
            .map_err(CollaboratorError::Cache)?;
        let manager = client.get_connection_manager().await.map_err(CollaboratorError::Cache)?;
        Ok(Self { client, manager })
    }

    /// Opens a dedicated pub/sub connection and forwards every message on
    /// `SUBSCRIBED_CHANNELS` to `handler`. Runs until the connection drops;
    /// the caller is expected to `tokio::spawn` this (C9). `handler` is
    /// async (rather than the plain `FnMut` a sync bus would take) since
    /// reacting to a bridge event (e.g. `update_cached_stats`) needs to
    /// await a DB read.
    pub async fn subscribe<F, Fut>(&self, handler: F) -> Result<(), CollaboratorError>
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let connection = self.client.get_async_connection().await.map_err(CollaboratorError::Cache)?;
        let mut pubsub = connection.into_pubsub();
        for channel in SUBSCRIBED_CHANNELS {
            pubsub.subscribe(*channel).await.map_err(CollaboratorError::Cache)?;
        }
        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let channel = msg.get_channel_name().to_owned();
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(_) => continue,
            };
            handler(channel, payload).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for CacheBus {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.set(key, value).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.set_ex(key, value, seconds).await?)
    }

    async fn del(&self, key: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.del(key).await?)
    }

    async fn zrevrank(&self, key: &str, member: &str) -> Result<Option<i64>, CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.zrevrank(key, member).await?)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.sadd(key, member).await?)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.srem(key, member).await?)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.sismember(key, member).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool, CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.exists(key).await?)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), CollaboratorError> {
        let mut conn = self.manager.clone();
        Ok(conn.publish(channel, payload).await?)
    }
}
