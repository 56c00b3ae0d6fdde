//! Bearer token store
//!
//! One opaque token row per (role, user). A token's existence is the
//! whole session: created on first login, returned unchanged on repeat
//! logins, removed on logout. There is no expiry column; revocation is
//! deletion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use carelink_core::{CareError, CareResult};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::identity::RoleTag;

#[cfg(feature = "sqlite")]
use sqlx::{Row, SqlitePool};

/// Attempts at generating a fresh random key before giving up. A
/// collision at 20 bytes of entropy is vanishingly rare but the
/// generation is still a loop, not a single shot.
const KEY_GENERATION_ATTEMPTS: usize = 8;

/// One stored token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub key: String,
    pub role: RoleTag,
    pub user_id: i64,
    pub created: DateTime<Utc>,
}

/// Generate an opaque token key: 20 random bytes, hex-encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Token store supporting both in-memory and database storage.
#[derive(Debug, Clone)]
pub enum TokenStore {
    /// In-memory storage (for development and testing)
    Memory(MemoryTokenStore),
    /// Database storage (for production)
    #[cfg(feature = "sqlite")]
    Database(DatabaseTokenStore),
}

impl TokenStore {
    /// Create an in-memory token store.
    pub fn memory() -> Self {
        Self::Memory(MemoryTokenStore::default())
    }

    /// Create a database-backed token store, bootstrapping its table.
    #[cfg(feature = "sqlite")]
    pub async fn database(pool: SqlitePool) -> CareResult<Self> {
        Ok(Self::Database(DatabaseTokenStore::new(pool).await?))
    }

    /// Return the existing token for (role, user) or create one with a
    /// fresh random key.
    pub async fn get_or_create(&self, role: RoleTag, user_id: i64) -> CareResult<TokenRecord> {
        match self {
            Self::Memory(store) => store.get_or_create(role, user_id),
            #[cfg(feature = "sqlite")]
            Self::Database(store) => store.get_or_create(role, user_id).await,
        }
    }

    /// Resolve a token key to the owning user id. A miss is `None`, not
    /// an error; the authenticator treats it as a decline signal.
    pub async fn lookup(&self, role: RoleTag, key: &str) -> CareResult<Option<i64>> {
        match self {
            Self::Memory(store) => store.lookup(role, key),
            #[cfg(feature = "sqlite")]
            Self::Database(store) => store.lookup(role, key).await,
        }
    }

    /// Delete the token for (role, user). Returns whether a row existed;
    /// deleting an absent token is not an error.
    pub async fn delete(&self, role: RoleTag, user_id: i64) -> CareResult<bool> {
        match self {
            Self::Memory(store) => store.delete(role, user_id),
            #[cfg(feature = "sqlite")]
            Self::Database(store) => store.delete(role, user_id).await,
        }
    }

    /// Number of lookups performed since creation. Lets tests assert
    /// that hint-skipped backends never touched storage.
    pub fn lookup_count(&self) -> u64 {
        match self {
            Self::Memory(store) => store.lookup_count(),
            #[cfg(feature = "sqlite")]
            Self::Database(store) => store.lookup_count(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryTokenInner {
    /// (role, key) -> user id
    by_key: HashMap<(RoleTag, String), i64>,
    /// (role, user id) -> key
    by_user: HashMap<(RoleTag, i64), String>,
    /// (role, key) -> created
    created: HashMap<(RoleTag, String), DateTime<Utc>>,
}

/// In-memory token store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<MemoryTokenInner>>,
    lookups: Arc<AtomicU64>,
}

impl MemoryTokenStore {
    fn get_or_create(&self, role: RoleTag, user_id: i64) -> CareResult<TokenRecord> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| CareError::internal("token store lock poisoned"))?;

        if let Some(key) = inner.by_user.get(&(role, user_id)).cloned() {
            let created = inner
                .created
                .get(&(role, key.clone()))
                .copied()
                .unwrap_or_else(Utc::now);
            return Ok(TokenRecord {
                key,
                role,
                user_id,
                created,
            });
        }

        for _ in 0..KEY_GENERATION_ATTEMPTS {
            let key = generate_key();
            if inner.by_key.contains_key(&(role, key.clone())) {
                continue;
            }
            let created = Utc::now();
            inner.by_key.insert((role, key.clone()), user_id);
            inner.by_user.insert((role, user_id), key.clone());
            inner.created.insert((role, key.clone()), created);
            debug!(role = %role, user_id, "created auth token");
            return Ok(TokenRecord {
                key,
                role,
                user_id,
                created,
            });
        }

        Err(CareError::internal(
            "exhausted token key generation attempts",
        ))
    }

    fn lookup(&self, role: RoleTag, key: &str) -> CareResult<Option<i64>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let inner = self
            .inner
            .read()
            .map_err(|_| CareError::internal("token store lock poisoned"))?;
        Ok(inner.by_key.get(&(role, key.to_string())).copied())
    }

    fn delete(&self, role: RoleTag, user_id: i64) -> CareResult<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| CareError::internal("token store lock poisoned"))?;

        match inner.by_user.remove(&(role, user_id)) {
            Some(key) => {
                inner.by_key.remove(&(role, key.clone()));
                inner.created.remove(&(role, key));
                debug!(role = %role, user_id, "deleted auth token");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

/// Database-backed token store.
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone)]
pub struct DatabaseTokenStore {
    pool: SqlitePool,
    lookups: Arc<AtomicU64>,
}

#[cfg(feature = "sqlite")]
impl DatabaseTokenStore {
    async fn new(pool: SqlitePool) -> CareResult<Self> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS auth_tokens (
                key TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created TEXT NOT NULL,
                UNIQUE(role, user_id)
            );
        "#;

        sqlx::query(query)
            .execute(&pool)
            .await
            .map_err(|e| CareError::storage_with("failed to create auth_tokens table", e))?;

        Ok(Self {
            pool,
            lookups: Arc::new(AtomicU64::new(0)),
        })
    }

    async fn fetch_for_user(
        &self,
        role: RoleTag,
        user_id: i64,
    ) -> CareResult<Option<TokenRecord>> {
        let row = sqlx::query(
            "SELECT key, created FROM auth_tokens WHERE role = ? AND user_id = ?",
        )
        .bind(role.to_string())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CareError::storage_with("failed to query auth token", e))?;

        Ok(row.map(|row| TokenRecord {
            key: row.get("key"),
            role,
            user_id,
            created: parse_timestamp(row.get("created")),
        }))
    }

    async fn get_or_create(&self, role: RoleTag, user_id: i64) -> CareResult<TokenRecord> {
        if let Some(existing) = self.fetch_for_user(role, user_id).await? {
            return Ok(existing);
        }

        for _ in 0..KEY_GENERATION_ATTEMPTS {
            let key = generate_key();
            let created = Utc::now();

            let result = sqlx::query(
                "INSERT INTO auth_tokens (key, role, user_id, created) VALUES (?, ?, ?, ?)",
            )
            .bind(&key)
            .bind(role.to_string())
            .bind(user_id)
            .bind(created.to_rfc3339())
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    debug!(role = %role, user_id, "created auth token");
                    return Ok(TokenRecord {
                        key,
                        role,
                        user_id,
                        created,
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    // Either the random key collided or a concurrent
                    // login won the (role, user) uniqueness race. Retry
                    // as a fetch; fall through to fresh randomness if
                    // the winner is not visible yet.
                    if let Some(existing) = self.fetch_for_user(role, user_id).await? {
                        return Ok(existing);
                    }
                }
                Err(e) => {
                    return Err(CareError::storage_with("failed to insert auth token", e));
                }
            }
        }

        Err(CareError::internal(
            "exhausted token key generation attempts",
        ))
    }

    async fn lookup(&self, role: RoleTag, key: &str) -> CareResult<Option<i64>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let row = sqlx::query("SELECT user_id FROM auth_tokens WHERE role = ? AND key = ?")
            .bind(role.to_string())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to look up auth token", e))?;

        Ok(row.map(|row| row.get("user_id")))
    }

    async fn delete(&self, role: RoleTag, user_id: i64) -> CareResult<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE role = ? AND user_id = ?")
            .bind(role.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to delete auth token", e))?;

        Ok(result.rows_affected() > 0)
    }

    fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "sqlite")]
fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed")
    )
}

#[cfg(feature = "sqlite")]
fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
