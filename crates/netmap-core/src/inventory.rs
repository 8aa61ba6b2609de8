//! Inventory records: routers, their interfaces, and user accounts.

use serde::{Deserialize, Serialize};

/// A global user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub permissions: String,
    /// Device hostnames this user is assigned to.
    #[serde(default)]
    pub devices: Vec<String>,
}

/// A user account configured on a single router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouterUser {
    pub username: String,
    pub permissions: String,
}

impl RouterUser {
    pub fn new(username: impl Into<String>, permissions: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            permissions: permissions.into(),
        }
    }
}

/// A physical or logical router interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interface {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    pub ip: String,
    pub subnet_mask: String,
    pub status: String,
    /// Hostname of the router on the other end of the link, if any.
    pub connected_router: Option<String>,
}

/// A managed router. Identified by `hostname`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Router {
    pub hostname: String,
    pub loopback_ip: String,
    pub admin_ip: String,
    pub role: String,
    pub company: String,
    pub os: String,
    #[serde(default)]
    pub active_interfaces: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub users: Vec<RouterUser>,
}
