pub mod error;
pub mod file;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use memory::{DisabledStore, MemoryStore};
pub use redis_store::{RedisStore, RedisStoreConfig};
pub use store::{storage_key, KeyValueStore};
