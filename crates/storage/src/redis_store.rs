use crate::error::{Result, StorageError};
use crate::store::KeyValueStore;
use redis::{Client, Commands, Connection};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

impl RedisStoreConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| Self::default().url),
        }
    }
}

/// Redis-backed storage over a single blocking connection.
pub struct RedisStore {
    conn: Mutex<Connection>,
}

impl RedisStore {
    pub fn new(config: RedisStoreConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let conn = client.get_connection()?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ping Redis to check connection
    pub fn ping(&self) -> Result<()> {
        let mut conn = self.conn()?;
        redis::cmd("PING").query::<()>(&mut *conn)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("redis connection lock poisoned".to_string()))
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn()?.get(key)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.set::<_, _, ()>(key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn()?.del::<_, ()>(key)?;
        Ok(())
    }

    /// `SET ... XX` writes only when the key already exists.
    fn replace(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("XX")
            .query(&mut *conn)?;
        Ok(reply.is_some())
    }

    /// Uses MSET so the batch is applied atomically.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.conn()?.mset::<_, _, ()>(entries)?;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.conn()?.del::<_, ()>(keys)?;
        Ok(())
    }
}
