//! Storage adapters for tasklist: the local cache slot and the remote task table.

pub mod error;
pub mod local;
pub mod remote;

pub use error::{CacheError, RemoteError};
pub use local::{FileCache, LocalCache, MemoryCache};
pub use remote::{MemoryRemote, RemoteCall, RemoteRow, RemoteStore, RestConfig, RestRemote};
