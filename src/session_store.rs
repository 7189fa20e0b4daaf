use std::collections::HashMap;
use std::sync::Arc;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::MAX_SESSION_DURATION_DAYS;
use crate::error::{AppError, Result};
use crate::models::session::Session;

/// Server-side session persistence, keyed by the id in the signed cookie.
#[derive(Clone)]
pub enum SessionStore {
    /// Process-local map. Sessions die with the process.
    Memory(Arc<RwLock<HashMap<Uuid, Session>>>),
    /// Redis with a TTL per entry.
    Redis {
        conn: ConnectionManager,
        ttl_seconds: u64,
    },
}

fn session_key(id: Uuid) -> String {
    format!("session:{}", id)
}

impl SessionStore {
    /// Creates an empty in-memory store.
    pub fn memory() -> Self {
        SessionStore::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - The URL of the Redis server.
    /// * `session_duration_days` - TTL applied to every saved session.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SessionStore`.
    pub async fn redis(redis_url: &str, session_duration_days: i64) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(SessionStore::Redis {
            conn,
            ttl_seconds: session_duration_days.clamp(1, MAX_SESSION_DURATION_DAYS) as u64 * 86400,
        })
    }

    /// Loads a session, `None` if it does not exist (or has expired in Redis).
    pub async fn load(&self, id: Uuid) -> Result<Option<Session>> {
        match self {
            SessionStore::Memory(map) => Ok(map.read().await.get(&id).cloned()),
            SessionStore::Redis { conn, .. } => {
                let mut conn = conn.clone();
                let raw: Option<String> = conn.get(session_key(id)).await?;
                match raw {
                    Some(json) => match sonic_rs::from_str::<Session>(&json) {
                        Ok(session) => Ok(Some(session)),
                        Err(e) => {
                            tracing::warn!("❌ Invalid session JSON for {}: {}", id, e);
                            Ok(None)
                        }
                    },
                    None => Ok(None),
                }
            }
        }
    }

    /// Saves (inserts or overwrites) a session.
    pub async fn save(&self, id: Uuid, session: &Session) -> Result<()> {
        match self {
            SessionStore::Memory(map) => {
                map.write().await.insert(id, session.clone());
            }
            SessionStore::Redis { conn, ttl_seconds } => {
                let json = sonic_rs::to_string(session)
                    .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;
                let mut conn = conn.clone();
                let _: () = conn.set_ex(session_key(id), json, *ttl_seconds).await?;
            }
        }
        tracing::debug!("✅ Session saved: session:{}", id);
        Ok(())
    }

    /// Deletes a session; deleting a missing session is not an error.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self {
            SessionStore::Memory(map) => {
                map.write().await.remove(&id);
            }
            SessionStore::Redis { conn, .. } => {
                let mut conn = conn.clone();
                let _: () = conn.del(session_key(id)).await?;
            }
        }
        tracing::debug!("🗑️ Session deleted: session:{}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_save_load_delete() {
        let store = SessionStore::memory();
        let id = Uuid::new_v4();
        assert!(store.load(id).await.unwrap().is_none());

        let session = Session {
            track_name: Some("EARFQUAKE".into()),
            ..Session::default()
        };
        store.save(id, &session).await.unwrap();
        assert_eq!(store.load(id).await.unwrap(), Some(session));

        store.delete(id).await.unwrap();
        assert!(store.load(id).await.unwrap().is_none());
        store.delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_keeps_sessions_apart() {
        let store = SessionStore::memory();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .save(a, &Session { device_id: Some("a".into()), ..Session::default() })
            .await
            .unwrap();

        assert!(store.load(b).await.unwrap().is_none());
        assert_eq!(
            store.load(a).await.unwrap().unwrap().device_id.as_deref(),
            Some("a")
        );
    }
}
