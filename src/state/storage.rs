//! Session storage implementation
//!
//! Per-user session persistence behind the [`SessionStore`] trait, with an
//! in-process map and a Redis backend (JSON values with TTL).

use std::collections::HashMap;
use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::config::RedisConfig;
use crate::models::ModelKey;
use crate::utils::errors::Result;
use super::context::UserSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session, creating a default one on first interaction
    async fn get_or_create(&self, user_id: i64) -> Result<UserSession>;

    async fn save(&self, session: &UserSession) -> Result<()>;

    /// Increment the counter for `model` and return the new count.
    ///
    /// Fails with `QuotaExceeded` and leaves the session untouched when the
    /// current count already reached `limit`.
    async fn record_generation_used(&self, user_id: i64, model: ModelKey, limit: u32) -> Result<u32>;

    /// Restore defaults, independent of admin configuration
    async fn reset(&self, user_id: i64) -> Result<UserSession>;

    async fn set_selected_model(&self, user_id: i64, model: ModelKey) -> Result<()>;
}

/// Sessions kept in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<i64, UserSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_or_create(&self, user_id: i64) -> Result<UserSession> {
        if let Some(session) = self.sessions.read().await.get(&user_id) {
            return Ok(session.clone());
        }

        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .entry(user_id)
            .or_insert_with(|| UserSession::new(user_id))
            .clone())
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        self.sessions.write().await.insert(session.user_id, session.clone());
        Ok(())
    }

    async fn record_generation_used(&self, user_id: i64, model: ModelKey, limit: u32) -> Result<u32> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id).or_insert_with(|| UserSession::new(user_id));
        session.record_generation(model, limit)
    }

    async fn reset(&self, user_id: i64) -> Result<UserSession> {
        let session = UserSession::new(user_id);
        self.sessions.write().await.insert(user_id, session.clone());
        Ok(session)
    }

    async fn set_selected_model(&self, user_id: i64, model: ModelKey) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id).or_insert_with(|| UserSession::new(user_id));
        session.selected_model = Some(model);
        session.touch();
        Ok(())
    }
}

/// Redis-backed sessions under `{prefix}session:{user_id}`
#[derive(Clone)]
pub struct RedisSessionStore {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
}

impl RedisSessionStore {
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn session_key(&self, user_id: i64) -> String {
        format!("{}session:{}", self.config.prefix, user_id)
    }

    async fn load(&self, user_id: i64) -> Result<Option<UserSession>> {
        let key = self.session_key(user_id);
        let mut conn = self.connection_manager.clone();

        let serialized = conn.get::<_, Option<String>>(&key).await.map_err(|e| {
            error!(user_id = user_id, error = %e, "Failed to get session from Redis");
            e
        })?;

        match serialized {
            Some(data) => {
                let session = serde_json::from_str::<UserSession>(&data).map_err(|e| {
                    error!(user_id = user_id, error = %e, "Failed to deserialize session");
                    e
                })?;
                Ok(Some(session))
            }
            None => {
                debug!(user_id = user_id, "No session found in Redis");
                Ok(None)
            }
        }
    }

    async fn store(&self, session: &UserSession) -> Result<()> {
        let key = self.session_key(session.user_id);
        let serialized = serde_json::to_string(session)?;
        let mut conn = self.connection_manager.clone();

        conn.set_ex::<_, _, ()>(&key, serialized, self.config.ttl_seconds)
            .await
            .map_err(|e| {
                error!(user_id = session.user_id, error = %e, "Failed to save session to Redis");
                e
            })?;

        debug!(user_id = session.user_id, state = %session.state, ttl_seconds = self.config.ttl_seconds, "Session saved");
        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_or_create(&self, user_id: i64) -> Result<UserSession> {
        match self.load(user_id).await? {
            Some(session) => Ok(session),
            None => {
                let session = UserSession::new(user_id);
                self.store(&session).await?;
                Ok(session)
            }
        }
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        self.store(session).await
    }

    // Read-modify-write; callers serialize per user
    async fn record_generation_used(&self, user_id: i64, model: ModelKey, limit: u32) -> Result<u32> {
        let mut session = self.get_or_create(user_id).await?;
        let count = session.record_generation(model, limit)?;
        self.store(&session).await?;
        Ok(count)
    }

    async fn reset(&self, user_id: i64) -> Result<UserSession> {
        let session = UserSession::new(user_id);
        self.store(&session).await?;
        Ok(session)
    }

    async fn set_selected_model(&self, user_id: i64, model: ModelKey) -> Result<()> {
        let mut session = self.get_or_create(user_id).await?;
        session.selected_model = Some(model);
        session.touch();
        self.store(&session).await
    }
}
