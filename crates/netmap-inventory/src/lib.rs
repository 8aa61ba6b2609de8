//! netmap-inventory: In-memory stores for users and routers.
//!
//! Plain keyed collections guarded by a lock. Lookups are by username or
//! router hostname; misses are reported as typed errors carrying the key.

pub mod error;
pub mod routers;
pub mod users;

pub use error::{InventoryError, Result};
pub use routers::RouterStore;
pub use users::{UserStore, UserUpdate};
