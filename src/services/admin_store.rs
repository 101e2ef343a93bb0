//! Admin store
//!
//! Durable admin allow-list, maintenance flag and per-model generation
//! limits. Reads never fail for callers: broken or missing backing data falls
//! back to defaults and is reported to the diagnostics sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::models::{AdminConfig, ModelKey, DEFAULT_ADMIN_ID};
use crate::utils::diagnostics::{Diagnostic, SharedSink};
use crate::utils::errors::{RelayError, Result};

const COMPONENT: &str = "admin_store";

/// Raw storage for the serialized admin configuration
pub trait AdminBackend: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, raw: &str) -> Result<()>;
    fn describe(&self) -> String;
}

/// Pretty-printed JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl AdminBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend; clones share contents
#[derive(Debug, Clone, Default)]
pub struct MemoryAdminBackend {
    contents: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryAdminBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-filled with raw (possibly invalid) contents
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let backend = Self::default();
        if let Ok(mut contents) = backend.contents.lock() {
            *contents = Some(raw.into());
        }
        backend
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }

    pub fn set_raw(&self, raw: impl Into<String>) {
        if let Ok(mut contents) = self.contents.lock() {
            *contents = Some(raw.into());
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }
}

impl AdminBackend for MemoryAdminBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn store(&self, raw: &str) -> Result<()> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(RelayError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "writes disabled",
            )));
        }
        self.set_raw(raw);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Cached admin configuration over an [`AdminBackend`]
pub struct AdminStore {
    backend: Arc<dyn AdminBackend>,
    state: RwLock<AdminConfig>,
    seed_admins: Vec<i64>,
    sink: SharedSink,
}

impl AdminStore {
    /// Create a store holding defaults; call [`AdminStore::init`] to load.
    pub fn new(backend: Arc<dyn AdminBackend>, seed_admins: Vec<i64>, sink: SharedSink) -> Self {
        let seed_admins = if seed_admins.is_empty() { vec![DEFAULT_ADMIN_ID] } else { seed_admins };
        Self {
            backend,
            state: RwLock::new(AdminConfig::with_admins(seed_admins.iter().copied())),
            seed_admins,
            sink,
        }
    }

    /// Load backing data; writes defaults when none exists yet
    pub fn init(&self) -> AdminConfig {
        let config = match self.backend.load() {
            Ok(None) => {
                let defaults = self.defaults();
                info!(backend = %self.backend.describe(), "No admin config found, writing defaults");
                self.persist(&defaults);
                defaults
            }
            Ok(Some(raw)) => self.parse_or_default(&raw),
            Err(e) => self.fall_back(e),
        };

        self.replace(config.clone());
        config
    }

    /// Re-read backing data without writing anything
    pub fn reload(&self) -> AdminConfig {
        let config = match self.backend.load() {
            Ok(None) => self.defaults(),
            Ok(Some(raw)) => self.parse_or_default(&raw),
            Err(e) => self.fall_back(e),
        };

        self.replace(config.clone());
        config
    }

    /// Flush the current in-memory state to the backend
    pub fn teardown(&self) {
        let snapshot = self.snapshot();
        self.persist(&snapshot);
        debug!(backend = %self.backend.describe(), "Admin store flushed");
    }

    pub fn snapshot(&self) -> AdminConfig {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).admins.contains(&user_id)
    }

    pub fn admins(&self) -> Vec<i64> {
        self.snapshot().admins.into_iter().collect()
    }

    /// Idempotent; persists immediately
    pub fn add_admin(&self, user_id: i64) {
        self.mutate(|config| {
            config.admins.insert(user_id);
        });
    }

    /// Idempotent; persists immediately
    pub fn remove_admin(&self, user_id: i64) {
        self.mutate(|config| {
            config.admins.remove(&user_id);
        });
    }

    pub fn set_maintenance_mode(&self, enabled: bool) {
        self.mutate(|config| config.maintenance_mode = enabled);
    }

    pub fn maintenance_mode(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).maintenance_mode
    }

    pub fn generation_limits(&self) -> BTreeMap<ModelKey, u32> {
        self.snapshot().generation_limits
    }

    pub fn generation_limit(&self, model: ModelKey) -> u32 {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .limit_for(model)
            .unwrap_or_else(|| crate::models::default_limit(model))
    }

    /// Fails with `UnknownModel` when the model has no entry, leaving the map unchanged
    pub fn set_generation_limit(&self, model: ModelKey, limit: u32) -> Result<()> {
        let updated = self.mutate(|config| match config.generation_limits.get_mut(&model) {
            Some(current) => {
                *current = limit;
                true
            }
            None => false,
        });

        if updated {
            Ok(())
        } else {
            Err(RelayError::UnknownModel(model.quota_key().to_string()))
        }
    }

    pub fn set_generation_limit_by_key(&self, key: &str, limit: u32) -> Result<()> {
        let model = ModelKey::from_quota_key(key)
            .ok_or_else(|| RelayError::UnknownModel(key.to_string()))?;
        self.set_generation_limit(model, limit)
    }

    fn defaults(&self) -> AdminConfig {
        AdminConfig::with_admins(self.seed_admins.iter().copied())
    }

    fn replace(&self, config: AdminConfig) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = config;
    }

    /// Apply a change under the write lock, then persist the result
    fn mutate<R>(&self, change: impl FnOnce(&mut AdminConfig) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            let result = change(&mut state);
            (result, state.clone())
        };
        self.persist(&snapshot);
        result
    }

    fn persist(&self, config: &AdminConfig) {
        let outcome = config.to_json_pretty().and_then(|raw| self.backend.store(&raw));
        if let Err(e) = outcome {
            warn!(backend = %self.backend.describe(), error = %e, "Failed to write admin config");
            self.sink.report(Diagnostic::error(
                COMPONENT,
                format!("failed to write {}: {}", self.backend.describe(), e),
            ));
        }
    }

    fn parse_or_default(&self, raw: &str) -> AdminConfig {
        match AdminConfig::from_json_str(raw) {
            Ok(config) => config,
            Err(e) => self.fall_back(e),
        }
    }

    fn fall_back(&self, error: RelayError) -> AdminConfig {
        warn!(backend = %self.backend.describe(), error = %error, "Admin config unreadable, using defaults");
        self.sink.report(Diagnostic::warning(
            COMPONENT,
            format!("failed to read {}: {}", self.backend.describe(), error),
        ));
        self.defaults()
    }
}
