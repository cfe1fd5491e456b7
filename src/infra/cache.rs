//! Session store: live sessions and windowed counters.
//!
//! Redis backs it in production; the in-memory store serves the demo
//! backend and tests.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{Config, CACHE_PREFIX_SESSION};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Session store trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a session that expires after `ttl_seconds`
    async fn put_session(&self, session_id: &str, user_id: Uuid, ttl_seconds: u64)
        -> AppResult<()>;

    async fn session_active(&self, session_id: &str) -> AppResult<bool>;

    async fn revoke_session(&self, session_id: &str) -> AppResult<()>;

    /// Count one hit against `key` in a fixed window starting at the first
    /// hit. Returns the count including this one.
    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64>;

    /// Clear a counter
    async fn reset(&self, key: &str) -> AppResult<()>;

    async fn ping(&self) -> AppResult<()>;
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", CACHE_PREFIX_SESSION, session_id)
}

/// Redis session store with connection pooling.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis, returning an error instead of panicking.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis session store connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(session_key(session_id), user_id.to_string(), ttl_seconds)
            .await
            .map_err(cache_error)
    }

    async fn session_active(&self, session_id: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        conn.exists(session_key(session_id))
            .await
            .map_err(cache_error)
    }

    async fn revoke_session(&self, session_id: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(session_key(session_id))
            .await
            .map_err(cache_error)
    }

    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(key, 1).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window
            conn.expire::<_, ()>(key, i64::try_from(window_seconds).unwrap_or(i64::MAX))
                .await
                .map_err(cache_error)?;
        }

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::Cache(e)
}

#[derive(Default)]
struct Entries {
    sessions: HashMap<String, Instant>,
    counters: HashMap<String, (u64, Instant)>,
}

/// In-process session store. Expiry is checked lazily on read.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<Entries>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| AppError::internal("Session store lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put_session(
        &self,
        session_id: &str,
        _user_id: Uuid,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.lock()?.sessions.insert(session_key(session_id), expires);
        Ok(())
    }

    async fn session_active(&self, session_id: &str) -> AppResult<bool> {
        let mut entries = self.lock()?;
        let key = session_key(session_id);
        match entries.sessions.get(&key) {
            Some(expires) if *expires > Instant::now() => Ok(true),
            Some(_) => {
                entries.sessions.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn revoke_session(&self, session_id: &str) -> AppResult<()> {
        self.lock()?.sessions.remove(&session_key(session_id));
        Ok(())
    }

    async fn hit(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let entry = entries
            .counters
            .entry(key.to_string())
            .or_insert((0, now + Duration::from_secs(window_seconds)));

        if entry.1 <= now {
            *entry = (0, now + Duration::from_secs(window_seconds));
        }
        entry.0 += 1;
        Ok(entry.0)
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        self.lock()?.counters.remove(key);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keys_are_prefixed() {
        assert_eq!(session_key("abc"), "session:abc");
    }

    #[tokio::test]
    async fn test_memory_session_lifecycle() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();

        store.put_session("s1", user_id, 60).await.unwrap();
        assert!(store.session_active("s1").await.unwrap());

        store.revoke_session("s1").await.unwrap();
        assert!(!store.session_active("s1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_session_expires() {
        let store = MemorySessionStore::new();
        store.put_session("s1", Uuid::new_v4(), 5).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!store.session_active("s1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_counter_window_resets() {
        let store = MemorySessionStore::new();

        assert_eq!(store.hit("k", 10).await.unwrap(), 1);
        assert_eq!(store.hit("k", 10).await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.hit("k", 10).await.unwrap(), 1);

        store.reset("k").await.unwrap();
        assert_eq!(store.hit("k", 10).await.unwrap(), 1);
    }
}
