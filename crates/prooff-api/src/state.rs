//! # Application State
//!
//! Shared state for the Axum application: the anchor service, certificate
//! issuer, in-memory stores, the optional vault key and the optional
//! database pool.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use prooff_anchor::{
    AnchorConfig, AnchorError, AnchorRecord, AnchorService, AnchorStore, Certificate,
    CertificateIssuer, InMemoryAnchorStore, StoreError,
};
use prooff_core::{CertificateId, Clock, SystemClock, WalletId};
use prooff_crypto::{CreatorWallet, VaultKey};
use sqlx::PgPool;

use crate::middleware::metrics::ApiMetrics;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across an `.await`.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, T: Clone> Store<K, T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, T: Clone> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Write-through anchor store -----------------------------------------------

/// [`AnchorStore`] that keeps records in memory and, when a pool is
/// configured, writes them to Postgres first.
///
/// Postgres decides duplicates across processes (`ON CONFLICT DO NOTHING`);
/// the in-memory map decides them within one.
#[derive(Debug, Clone)]
pub struct WriteThroughAnchorStore {
    memory: InMemoryAnchorStore,
    pool: Option<PgPool>,
}

impl WriteThroughAnchorStore {
    pub fn new(memory: InMemoryAnchorStore, pool: Option<PgPool>) -> Self {
        Self { memory, pool }
    }

    /// Mirror a row this store just inserted into Postgres.
    ///
    /// A concurrent `load` may already have copied the row into memory; the
    /// save still succeeded.
    fn cache_persisted(&self, record: AnchorRecord) -> Result<(), StoreError> {
        let certificate_id = record.certificate_id.clone();
        if self.memory.insert_if_absent(record.clone()) {
            return Ok(());
        }
        match self.memory.get(&certificate_id) {
            Some(cached) if cached == record => Ok(()),
            _ => Err(StoreError::Duplicate { certificate_id }),
        }
    }
}

#[async_trait]
impl AnchorStore for WriteThroughAnchorStore {
    async fn save(&self, record: AnchorRecord) -> Result<(), StoreError> {
        let certificate_id = record.certificate_id.clone();
        if self.memory.get(&certificate_id).is_some() {
            return Err(StoreError::Duplicate { certificate_id });
        }

        if let Some(pool) = &self.pool {
            let inserted = crate::db::anchors::insert(pool, &record).await.map_err(|e| {
                tracing::error!(certificate_id = %certificate_id, error = %e, "failed to persist anchor record");
                StoreError::Backend(e.to_string())
            })?;
            if !inserted {
                return Err(StoreError::Duplicate { certificate_id });
            }
            return self.cache_persisted(record);
        }

        if self.memory.insert_if_absent(record) {
            Ok(())
        } else {
            Err(StoreError::Duplicate { certificate_id })
        }
    }

    async fn load(&self, certificate_id: &CertificateId) -> Result<Option<AnchorRecord>, StoreError> {
        if let Some(record) = self.memory.get(certificate_id) {
            return Ok(Some(record));
        }
        let Some(pool) = &self.pool else {
            return Ok(None);
        };
        let record = crate::db::anchors::get_by_certificate_id(pool, certificate_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if let Some(record) = &record {
            self.memory.insert_if_absent(record.clone());
        }
        Ok(record)
    }
}

// -- Application State --------------------------------------------------------

/// Runtime configuration for the API binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub anchor: AnchorConfig,
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub anchors: Arc<AnchorService>,
    pub issuer: CertificateIssuer,
    /// In-memory view of the anchor store, shared with `anchors`.
    pub anchor_records: InMemoryAnchorStore,
    pub certificates: Store<CertificateId, Certificate>,
    pub wallets: Store<WalletId, CreatorWallet>,
    /// Seals creator wallet secrets. Wallet routes answer 503 without it.
    pub vault_key: Option<Arc<VaultKey>>,
    pub db_pool: Option<PgPool>,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// Build state from anchoring config with the system clock.
    pub fn new(
        anchor: &AnchorConfig,
        vault_key: Option<VaultKey>,
        db_pool: Option<PgPool>,
    ) -> Result<Self, AnchorError> {
        Self::with_clock(anchor, vault_key, db_pool, Arc::new(SystemClock))
    }

    pub fn with_clock(
        anchor: &AnchorConfig,
        vault_key: Option<VaultKey>,
        db_pool: Option<PgPool>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AnchorError> {
        let anchor_records = InMemoryAnchorStore::new();
        let store = WriteThroughAnchorStore::new(anchor_records.clone(), db_pool.clone());
        let anchors = Arc::new(AnchorService::from_config(anchor, Arc::new(store), clock)?);
        Ok(Self {
            issuer: CertificateIssuer::new(Arc::clone(&anchors)),
            anchors,
            anchor_records,
            certificates: Store::new(),
            wallets: Store::new(),
            vault_key: vault_key.map(Arc::new),
            db_pool,
            metrics: ApiMetrics::new(),
        })
    }

    /// Load persisted anchors, certificates and wallets into memory.
    ///
    /// No-op without a database pool.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let records = crate::db::anchors::load_all(pool)
            .await
            .map_err(|e| format!("failed to load anchor records: {e}"))?;
        let record_count = records.len();
        for record in records {
            self.anchor_records.insert_if_absent(record);
        }

        let certificates = crate::db::certificates::load_all(pool)
            .await
            .map_err(|e| format!("failed to load certificates: {e}"))?;
        let certificate_count = certificates.len();
        for certificate in certificates {
            self.certificates.insert(certificate.id.clone(), certificate);
        }

        let wallets = crate::db::wallets::load_all(pool)
            .await
            .map_err(|e| format!("failed to load creator wallets: {e}"))?;
        let wallet_count = wallets.len();
        for wallet in wallets {
            self.wallets.insert(wallet.id, wallet);
        }

        tracing::info!(
            anchor_records = record_count,
            certificates = certificate_count,
            wallets = wallet_count,
            "hydrated in-memory stores from database"
        );
        Ok(())
    }
}
