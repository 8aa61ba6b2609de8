//! Error types for the netmap-inventory crate.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InventoryError {
    #[error("User '{username}' not found")]
    UserNotFound { username: String },

    #[error("User '{username}' already exists")]
    UserExists { username: String },

    #[error("Router '{hostname}' not found")]
    RouterNotFound { hostname: String },

    #[error("User '{username}' not found on router '{hostname}'")]
    RouterUserNotFound { hostname: String, username: String },
}

impl InventoryError {
    /// True for lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Self::UserExists { .. })
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
