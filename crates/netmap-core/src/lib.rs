//! netmap-core: Shared domain types for the netmap service.
//!
//! This crate provides the types exchanged between the discovery daemon,
//! the inventory stores, and the HTTP layer:
//! - Topology types (`Device`, `Connection`, `Topology`, `Snapshot`)
//! - Inventory records (`Router`, `Interface`, `RouterUser`, `User`)

pub mod inventory;
pub mod types;

pub use inventory::{Interface, Router, RouterUser, User};
pub use types::{Connection, Device, Snapshot, Topology};
