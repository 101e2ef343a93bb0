//! Authentication middleware
//!
//! Admin and maintenance checks backed by the admin store. Rights are read
//! on every call so revocations take effect immediately.

use std::sync::Arc;
use tracing::{debug, warn};
use crate::services::AdminStore;
use crate::utils::errors::{RelayError, Result};

#[derive(Clone)]
pub struct AuthMiddleware {
    admin_store: Arc<AdminStore>,
}

impl AuthMiddleware {
    pub fn new(admin_store: Arc<AdminStore>) -> Self {
        Self { admin_store }
    }

    /// Check if user is an admin
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_store.is_admin(user_id)
    }

    /// Check if user is authorized for admin commands
    pub fn check_admin_auth(&self, user_id: i64) -> Result<()> {
        if self.is_admin(user_id) {
            debug!(user_id = user_id, "Admin authentication successful");
            Ok(())
        } else {
            warn!(user_id = user_id, "Unauthorized admin access attempt");
            Err(RelayError::PermissionDenied(
                "Admin privileges required".to_string()
            ))
        }
    }

    /// `false` when maintenance is on and the user is not an admin
    pub fn passes_maintenance(&self, user_id: i64) -> bool {
        if !self.admin_store.maintenance_mode() {
            return true;
        }

        let admin = self.is_admin(user_id);
        if !admin {
            debug!(user_id = user_id, "Blocked by maintenance mode");
        }
        admin
    }
}
