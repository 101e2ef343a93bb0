//! Services module
//!
//! This module contains the durable admin store, subscription checks and
//! the factory wiring every shared service from settings.

pub mod admin_store;
pub mod subscription;

// Re-export commonly used services
pub use admin_store::{AdminBackend, AdminStore, JsonFileBackend, MemoryAdminBackend};
pub use subscription::{StaticSubscriptionChecker, SubscriptionChecker, TelegramSubscriptionChecker};

use std::sync::Arc;
use teloxide::Bot;
use tracing::{info, warn};

use crate::config::settings::{SessionBackend, Settings};
use crate::providers::{HttpGateway, ProviderGateway};
use crate::state::storage::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::utils::diagnostics::SharedSink;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub admin_store: Arc<AdminStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub gateway: Arc<dyn ProviderGateway>,
    pub subscriptions: Arc<dyn SubscriptionChecker>,
    pub sink: SharedSink,
    redis_sessions: Option<Arc<RedisSessionStore>>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    ///
    /// Loads the admin configuration, connects the session backend and
    /// builds the proxied provider gateway.
    pub async fn new(bot: Bot, settings: &Settings, sink: SharedSink) -> Result<Self> {
        let admin_store = Arc::new(AdminStore::new(
            Arc::new(JsonFileBackend::new(&settings.storage.admin_config_path)),
            settings.bot.admin_ids.clone(),
            sink.clone(),
        ));
        let loaded = admin_store.init();
        info!(admins = loaded.admins.len(), maintenance = loaded.maintenance_mode, "Admin configuration loaded");

        let mut redis_sessions = None;
        let sessions: Arc<dyn SessionStore> = match settings.storage.session_backend {
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
            SessionBackend::Redis => {
                let store = Arc::new(RedisSessionStore::new(settings.storage.redis.clone()).await?);
                store.test_connection().await?;
                info!("Redis session store connected");
                redis_sessions = Some(store.clone());
                store
            }
        };

        let gateway = HttpGateway::from_settings(&settings.providers, &settings.proxy, sink.clone())?;

        Ok(Self {
            admin_store,
            sessions,
            gateway: Arc::new(gateway),
            subscriptions: Arc::new(TelegramSubscriptionChecker::new(bot)),
            sink,
            redis_sessions,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = match &self.redis_sessions {
            Some(store) => match store.test_connection().await {
                Ok(()) => Some(true),
                Err(e) => {
                    warn!(error = %e, "Redis health check failed");
                    Some(false)
                }
            },
            None => None,
        };

        ServiceHealthStatus {
            redis_healthy,
            admin_store_ready: !self.admin_store.admins().is_empty(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    /// `None` when sessions live in memory
    pub redis_healthy: Option<bool>,
    pub admin_store_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.admin_store_ready && self.redis_healthy != Some(false)
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }
        if !self.admin_store_ready {
            issues.push("Admin store has no admins".to_string());
        }

        issues
    }
}
