//! Managed routers and the user accounts configured on each.

use std::sync::{PoisonError, RwLock};

use netmap_core::{Interface, Router, RouterUser};

use crate::error::{InventoryError, Result};

/// Routers keyed by hostname.
pub struct RouterStore {
    routers: RwLock<Vec<Router>>,
}

impl RouterStore {
    pub fn new(routers: Vec<Router>) -> Self {
        Self {
            routers: RwLock::new(routers),
        }
    }

    /// A store holding the two lab routers the service ships with.
    pub fn with_sample_data() -> Self {
        Self::new(sample_routers())
    }

    pub fn list(&self) -> Vec<Router> {
        self.read(|routers| routers.to_vec())
    }

    pub fn get(&self, hostname: &str) -> Result<Router> {
        self.with_router(hostname, |r| r.clone())
    }

    pub fn interfaces(&self, hostname: &str) -> Result<Vec<Interface>> {
        self.with_router(hostname, |r| r.interfaces.clone())
    }

    pub fn users(&self, hostname: &str) -> Result<Vec<RouterUser>> {
        self.with_router(hostname, |r| r.users.clone())
    }

    pub fn add_user(&self, hostname: &str, user: RouterUser) -> Result<RouterUser> {
        self.with_router_mut(hostname, |router| {
            tracing::debug!(hostname, username = %user.username, "Router user added");
            router.users.push(user.clone());
            Ok(user)
        })
    }

    pub fn update_user(&self, hostname: &str, username: &str, permissions: &str) -> Result<RouterUser> {
        self.with_router_mut(hostname, |router| {
            let user = router
                .users
                .iter_mut()
                .find(|u| u.username == username)
                .ok_or_else(|| InventoryError::RouterUserNotFound {
                    hostname: hostname.to_string(),
                    username: username.to_string(),
                })?;
            user.permissions = permissions.to_string();
            Ok(user.clone())
        })
    }

    /// Remove `username` from the router. Removing an absent user succeeds.
    pub fn delete_user(&self, hostname: &str, username: &str) -> Result<()> {
        self.with_router_mut(hostname, |router| {
            router.users.retain(|u| u.username != username);
            Ok(())
        })
    }

    fn read<T>(&self, f: impl FnOnce(&[Router]) -> T) -> T {
        f(&self.routers.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn with_router<T>(&self, hostname: &str, f: impl FnOnce(&Router) -> T) -> Result<T> {
        self.read(|routers| {
            routers
                .iter()
                .find(|r| r.hostname == hostname)
                .map(f)
                .ok_or_else(|| router_not_found(hostname))
        })
    }

    fn with_router_mut<T>(
        &self,
        hostname: &str,
        f: impl FnOnce(&mut Router) -> Result<T>,
    ) -> Result<T> {
        let mut routers = self.routers.write().unwrap_or_else(PoisonError::into_inner);
        let router = routers
            .iter_mut()
            .find(|r| r.hostname == hostname)
            .ok_or_else(|| router_not_found(hostname))?;
        f(router)
    }
}

fn router_not_found(hostname: &str) -> InventoryError {
    InventoryError::RouterNotFound {
        hostname: hostname.to_string(),
    }
}

fn interface(number: &str, ip: &str, peer: Option<&str>) -> Interface {
    Interface {
        kind: "Ethernet".to_string(),
        number: number.to_string(),
        ip: ip.to_string(),
        subnet_mask: "255.255.255.0".to_string(),
        status: "up".to_string(),
        connected_router: peer.map(String::from),
    }
}

fn sample_routers() -> Vec<Router> {
    vec![
        Router {
            hostname: "router1".to_string(),
            loopback_ip: "10.0.0.1".to_string(),
            admin_ip: "192.168.1.1".to_string(),
            role: "Core".to_string(),
            company: "Cisco".to_string(),
            os: "IOS".to_string(),
            active_interfaces: vec!["eth0".to_string(), "eth1".to_string()],
            interfaces: vec![
                interface("0", "192.168.1.1", None),
                interface("1", "172.16.0.1", Some("router2")),
            ],
            users: vec![
                RouterUser::new("admin", "read-write"),
                RouterUser::new("guest", "read-only"),
            ],
        },
        Router {
            hostname: "router2".to_string(),
            loopback_ip: "10.0.0.2".to_string(),
            admin_ip: "192.168.1.2".to_string(),
            role: "Edge".to_string(),
            company: "Juniper".to_string(),
            os: "JunOS".to_string(),
            active_interfaces: vec!["eth0".to_string()],
            interfaces: vec![interface("0", "172.16.0.2", Some("router1"))],
            users: vec![RouterUser::new("operator", "read-write")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_lookup() {
        let store = RouterStore::with_sample_data();
        assert_eq!(store.list().len(), 2);

        let r1 = store.get("router1").unwrap();
        assert_eq!(r1.company, "Cisco");
        assert_eq!(store.interfaces("router2").unwrap()[0].connected_router.as_deref(), Some("router1"));
        assert_eq!(store.users("router1").unwrap().len(), 2);
    }

    #[test]
    fn unknown_router_is_not_found() {
        let store = RouterStore::with_sample_data();
        let expected = InventoryError::RouterNotFound {
            hostname: "router9".to_string(),
        };
        assert_eq!(store.get("router9").unwrap_err(), expected);
        assert_eq!(store.interfaces("router9").unwrap_err(), expected);
        assert_eq!(
            store.add_user("router9", RouterUser::new("x", "read-only")).unwrap_err(),
            expected
        );
        assert_eq!(store.delete_user("router9", "x").unwrap_err(), expected);
    }

    #[test]
    fn router_user_lifecycle() {
        let store = RouterStore::with_sample_data();
        store
            .add_user("router2", RouterUser::new("noc", "read-only"))
            .unwrap();

        let updated = store.update_user("router2", "noc", "read-write").unwrap();
        assert_eq!(updated, RouterUser::new("noc", "read-write"));

        store.delete_user("router2", "noc").unwrap();
        let names: Vec<_> = store
            .users("router2")
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["operator"]);
    }

    #[test]
    fn update_of_absent_router_user_fails() {
        let store = RouterStore::with_sample_data();
        let err = store.update_user("router1", "nobody", "read-write").unwrap_err();
        assert_eq!(
            err,
            InventoryError::RouterUserNotFound {
                hostname: "router1".to_string(),
                username: "nobody".to_string(),
            }
        );
    }

    #[test]
    fn delete_of_absent_router_user_succeeds() {
        let store = RouterStore::with_sample_data();
        store.delete_user("router1", "nobody").unwrap();
        assert_eq!(store.users("router1").unwrap().len(), 2);
    }
}
