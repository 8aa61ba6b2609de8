//! Global user accounts.

use std::sync::{PoisonError, RwLock};

use netmap_core::User;

use crate::error::{InventoryError, Result};

/// Fields of a user that may be changed. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub permissions: Option<String>,
    pub devices: Option<Vec<String>>,
}

/// Users keyed by username.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, username: &str) -> Result<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| not_found(username))
    }

    pub fn add(&self, user: User) -> Result<User> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.iter().any(|u| u.username == user.username) {
            return Err(InventoryError::UserExists {
                username: user.username,
            });
        }

        tracing::debug!(username = %user.username, "User added");
        users.push(user.clone());
        Ok(user)
    }

    /// Apply `update` to an existing user. An empty permissions string is
    /// treated as absent.
    pub fn update(&self, username: &str, update: UserUpdate) -> Result<User> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| not_found(username))?;

        if let Some(permissions) = update.permissions.filter(|p| !p.is_empty()) {
            user.permissions = permissions;
        }
        if let Some(devices) = update.devices {
            user.devices = devices;
        }
        Ok(user.clone())
    }

    pub fn delete(&self, username: &str) -> Result<()> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let before = users.len();
        users.retain(|u| u.username != username);
        if users.len() == before {
            return Err(not_found(username));
        }

        tracing::debug!(username, "User deleted");
        Ok(())
    }
}

fn not_found(username: &str) -> InventoryError {
    InventoryError::UserNotFound {
        username: username.to_string(),
    }
}
