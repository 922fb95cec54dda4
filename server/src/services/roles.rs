use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::role::{Role, RoleInfo};
use crate::store::Store;

/// Outcome of one role lookup, including the default-role write it may cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleResolution {
    pub info: RoleInfo,
    pub created_default: bool,
}

#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn Store>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolves the caller's access tier.
    ///
    /// Anonymous callers get no role at all. A signed-in user without any
    /// assignment gets `user`, and a default assignment row is written for
    /// them; a failed write is logged and does not change the answer. Lookup
    /// failures degrade to `user` rather than failing the request.
    pub async fn resolve(&self, user_id: Option<Uuid>) -> RoleResolution {
        let Some(user_id) = user_id else {
            return RoleResolution {
                info: RoleInfo::anonymous(),
                created_default: false,
            };
        };

        let (role, created_default) = match self.store.latest_role(user_id).await {
            Ok(Some(role)) => {
                debug!(%user_id, role = role.as_str(), "Role found");
                (role, false)
            }
            Ok(None) => {
                info!(%user_id, "No role found for user, creating default user role");
                (Role::User, self.create_default(user_id).await)
            }
            Err(e) => {
                error!(%user_id, error = ?e, "Error fetching user role, defaulting to user");
                (Role::User, false)
            }
        };

        RoleResolution {
            info: RoleInfo::for_role(role),
            created_default,
        }
    }

    async fn create_default(&self, user_id: Uuid) -> bool {
        match self.store.insert_default_role(user_id).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(%user_id, "Default role already created by a concurrent request");
                false
            }
            Err(e) => {
                warn!(%user_id, error = ?e, "Error creating default role");
                false
            }
        }
    }
}
