//! Persistence seam for aggregated records.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::doctor::DoctorRecord;

/// Takes ownership of finished records at the end of a search operation.
///
/// `persist` must be an idempotent upsert keyed by
/// [`DoctorRecord::sink_key`] (normalized name + seed source): persisting
/// the same batch twice leaves the sink unchanged.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Upsert a batch of records.
    async fn persist(&self, records: &[DoctorRecord]) -> Result<()>;
}
