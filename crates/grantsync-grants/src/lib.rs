//! Grantsync Grants - permission backends and the agreement lifecycle coordinator

pub mod backend;
pub mod coordinator;
pub mod store;

pub use backend::{BackendError, BackendResult, PermissionBackend, Revocation};
pub use coordinator::{CoordinatorSettings, GrantCoordinator, GrantError, GrantResult, Outcome};
pub use store::LocalPermissionStore;
