//! In-memory sink, the default for tests and one-shot runs.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;
use crate::traits::RecordSink;
use crate::types::DoctorRecord;

/// Upserting sink backed by an insertion-ordered map.
///
/// Keys are [`DoctorRecord::sink_key`], so persisting the same record
/// twice overwrites in place rather than duplicating. Clones share the
/// underlying store.
#[derive(Clone, Default)]
pub struct MemorySink {
    store: Arc<RwLock<IndexMap<String, DoctorRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().unwrap().is_empty()
    }

    /// Snapshot of every stored record, in first-insertion order.
    pub fn records(&self) -> Vec<DoctorRecord> {
        self.store.read().unwrap().values().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<DoctorRecord> {
        self.store.read().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn persist(&self, records: &[DoctorRecord]) -> Result<()> {
        let mut store = self.store.write().unwrap();
        for record in records {
            store.insert(record.sink_key(), record.clone());
        }
        Ok(())
    }
}
