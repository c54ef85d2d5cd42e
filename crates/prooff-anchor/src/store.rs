//! Anchor persistence contract and the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use prooff_core::CertificateId;

use crate::error::StoreError;
use crate::record::AnchorRecord;

/// Where anchor records live. Records are immutable: `save` inserts only if
/// no record exists for the certificate id.
#[async_trait]
pub trait AnchorStore: Send + Sync + std::fmt::Debug {
    /// Persist a new record. Fails with [`StoreError::Duplicate`] if the
    /// certificate already has one.
    async fn save(&self, record: AnchorRecord) -> Result<(), StoreError>;

    /// Load the record for a certificate.
    async fn load(&self, certificate_id: &CertificateId) -> Result<Option<AnchorRecord>, StoreError>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAnchorStore {
    records: Arc<DashMap<CertificateId, AnchorRecord>>,
}

impl InMemoryAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record if absent. Returns false when one already exists.
    pub fn insert_if_absent(&self, record: AnchorRecord) -> bool {
        match self.records.entry(record.certificate_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, certificate_id: &CertificateId) -> Option<AnchorRecord> {
        self.records.get(certificate_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AnchorStore for InMemoryAnchorStore {
    async fn save(&self, record: AnchorRecord) -> Result<(), StoreError> {
        let certificate_id = record.certificate_id.clone();
        if self.insert_if_absent(record) {
            Ok(())
        } else {
            Err(StoreError::Duplicate { certificate_id })
        }
    }

    async fn load(&self, certificate_id: &CertificateId) -> Result<Option<AnchorRecord>, StoreError> {
        Ok(self.get(certificate_id))
    }
}

#[cfg(test)]
mod tests {
    use prooff_core::ContentHash;

    use super::*;
    use crate::composer::{AnchorFields, ExtraFields};
    use crate::network::Network;

    fn record(id: &str, ts: i64) -> AnchorRecord {
        AnchorRecord::seal(AnchorFields {
            content_hash: ContentHash::new("abc123").unwrap(),
            certificate_id: CertificateId::new(id).unwrap(),
            network: Network::LocalVerifiable,
            block: None,
            timestamp_ms: ts,
            extra: ExtraFields::new(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = InMemoryAnchorStore::new();
        let r = record("CERT-1", 1);
        store.save(r.clone()).await.unwrap();
        assert_eq!(store.load(&r.certificate_id).await.unwrap(), Some(r));
        assert_eq!(
            store.load(&CertificateId::new("CERT-2").unwrap()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn second_save_is_refused_and_first_kept() {
        let store = InMemoryAnchorStore::new();
        let first = record("CERT-1", 1);
        store.save(first.clone()).await.unwrap();
        let err = store.save(record("CERT-1", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(store.get(&first.certificate_id), Some(first));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_saves_persist_exactly_one() {
        let store = InMemoryAnchorStore::new();
        let mut handles = Vec::new();
        for ts in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.save(record("CERT-9", ts)).await.is_ok() }));
        }
        let mut successes = 0;
        for h in handles {
            if h.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
