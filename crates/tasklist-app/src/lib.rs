//! Application layer for tasklist.
//!
//! This crate wires the pure list logic from `tasklist-core` to the stores in
//! `tasklist-store`: configuration, the persistence coordinator, sync status
//! tracking and the interactive task session used by front ends.

pub mod config;
pub mod coordinator;
pub mod session;
pub mod sync_status;

// Re-exports for convenience
pub use config::{AppConfig, CacheConfig, RemoteConfig};
pub use coordinator::{PendingSave, PersistenceCoordinator, SaveOutcome};
pub use session::TaskSession;
pub use sync_status::{AttemptToken, SyncStatus, SyncTracker};
