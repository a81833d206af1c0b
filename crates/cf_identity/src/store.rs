//! Durable keypair storage
//!
//! The identity record lives under one well-known, schema-versioned slot.
//! The store is an interface so the backing can be swapped: an in-memory
//! store for tests and ephemeral sessions, a sqlite store for durable
//! installs. The sqlite backend seals the secret scalar at rest with a
//! caller-provided 32-byte store key (AES-256-GCM, slot-bound AAD).

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use crate::error::IdentityError;

/// The one logical key the identity record is stored under.
pub const IDENTITY_SLOT: &str = "identity/v1";

/// AAD binding sealed secrets to this schema version.
const SEAL_AAD: &[u8] = b"cf-identity/v1";

/// Persisted identity record. The secret scalar is crate-private; only
/// the public half is readable through the API.
#[derive(Clone)]
pub struct KeyRecord {
    pub public_spki: String,
    secret: Zeroizing<Vec<u8>>,
    pub created: DateTime<Utc>,
}

impl KeyRecord {
    pub(crate) fn new(
        public_spki: String,
        secret: Zeroizing<Vec<u8>>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            public_spki,
            secret,
            created,
        }
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl std::fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRecord")
            .field("public_spki", &self.public_spki)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// Durable-store interface for the single identity record.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn load(&self) -> Result<Option<KeyRecord>, IdentityError>;
    async fn store(&self, record: &KeyRecord) -> Result<(), IdentityError>;
}

// ── In-memory backend ────────────────────────────────────────────────────────

/// Process-lifetime store for tests and ephemeral sessions.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<RwLock<Option<KeyRecord>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn load(&self) -> Result<Option<KeyRecord>, IdentityError> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, record: &KeyRecord) -> Result<(), IdentityError> {
        *self.inner.write().await = Some(record.clone());
        Ok(())
    }
}

// ── Sqlite backend ───────────────────────────────────────────────────────────

/// Durable backend. Cheap to clone (pool is Arc internally).
#[derive(Clone)]
pub struct SqliteKeyStore {
    pool: SqlitePool,
    store_key: Zeroizing<[u8; 32]>,
}

impl SqliteKeyStore {
    /// Open over an existing pool, creating the table if needed.
    /// `store_key` seals the secret column; losing it orphans the record.
    pub async fn open(pool: SqlitePool, store_key: [u8; 32]) -> Result<Self, IdentityError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS identity_keys (
                slot TEXT PRIMARY KEY,
                public_spki TEXT NOT NULL,
                secret_sealed TEXT NOT NULL,
                created TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            store_key: Zeroizing::new(store_key),
        })
    }
}

#[async_trait]
impl KeyStore for SqliteKeyStore {
    async fn load(&self) -> Result<Option<KeyRecord>, IdentityError> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT public_spki, secret_sealed, created FROM identity_keys WHERE slot = ?",
        )
        .bind(IDENTITY_SLOT)
        .fetch_optional(&self.pool)
        .await?;

        let Some((public_spki, secret_sealed, created)) = row else {
            return Ok(None);
        };

        let sealed = B64.decode(secret_sealed)?;
        let secret = cf_crypto::aead::open(&self.store_key, &sealed, SEAL_AAD)?;
        Ok(Some(KeyRecord::new(public_spki, secret, created)))
    }

    async fn store(&self, record: &KeyRecord) -> Result<(), IdentityError> {
        let sealed = cf_crypto::aead::seal(&self.store_key, record.secret(), SEAL_AAD)?;

        sqlx::query(
            "INSERT INTO identity_keys (slot, public_spki, secret_sealed, created)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET
                 public_spki = excluded.public_spki,
                 secret_sealed = excluded.secret_sealed,
                 created = excluded.created",
        )
        .bind(IDENTITY_SLOT)
        .bind(&record.public_spki)
        .bind(B64.encode(sealed))
        .bind(record.created)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use uuid::Uuid;

    async fn temp_pool() -> (SqlitePool, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("cf-identity-test-{}.db", Uuid::new_v4()));
        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await.expect("open pool");
        (pool, path)
    }

    fn record() -> KeyRecord {
        KeyRecord::new(
            "c3BraQ==".into(),
            Zeroizing::new(vec![7u8; 32]),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn sqlite_roundtrip() {
        let (pool, path) = temp_pool().await;
        let store = SqliteKeyStore::open(pool, [9u8; 32]).await.expect("open");

        assert!(store.load().await.expect("load").is_none());

        let rec = record();
        store.store(&rec).await.expect("store");
        let loaded = store.load().await.expect("load").expect("some");
        assert_eq!(loaded.public_spki, rec.public_spki);
        assert_eq!(loaded.secret(), rec.secret());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn wrong_store_key_cannot_unseal() {
        let (pool, path) = temp_pool().await;
        let store = SqliteKeyStore::open(pool.clone(), [9u8; 32]).await.expect("open");
        store.store(&record()).await.expect("store");

        let other = SqliteKeyStore::open(pool, [8u8; 32]).await.expect("open");
        assert!(matches!(
            other.load().await,
            Err(IdentityError::Seal(cf_crypto::CryptoError::AeadDecrypt))
        ));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn store_overwrites_slot() {
        let (pool, path) = temp_pool().await;
        let store = SqliteKeyStore::open(pool, [9u8; 32]).await.expect("open");

        store.store(&record()).await.expect("store");
        let newer = KeyRecord::new("bmV3".into(), Zeroizing::new(vec![1u8; 32]), Utc::now());
        store.store(&newer).await.expect("overwrite");

        let loaded = store.load().await.expect("load").expect("some");
        assert_eq!(loaded.public_spki, "bmV3");

        let _ = std::fs::remove_file(&path);
    }
}
