//! Writing validated records to the store
//!
//! Each record is written independently: one rejected write is reported
//! and the rest proceed. Writes run on the blocking pool, at most
//! `max_concurrency` at a time.

use crate::schema::ExtractionSchema;
use crate::types::{PersistFailure, PersistReport, PersistedRecord, SourcedRecord};
use std::sync::Arc;
use storyforge_domain::{
    ExtractedRecord, FieldMap, FieldValue, OwnerMetadata, RecordId, RecordStore, RunId,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Writes records with their ownership tags
pub struct PersistenceSink<S: RecordStore> {
    store: Arc<S>,
    max_concurrency: usize,
}

impl<S> PersistenceSink<S>
where
    S: RecordStore + 'static,
{
    /// Create a sink over a shared store
    pub fn new(store: Arc<S>, max_concurrency: usize) -> Self {
        Self {
            store,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Field map written for one record: content fields plus ownership tags
    pub fn fields_for(
        record: &ExtractedRecord,
        owner: &OwnerMetadata,
        run_id: RunId,
        chunk_index: usize,
    ) -> FieldMap {
        let mut fields = record.to_fields();
        fields.insert("project".into(), owner.project_id.clone().into());
        match record {
            ExtractedRecord::Story(_) => {
                fields.insert("user".into(), owner.user_id.clone().into());
            }
            ExtractedRecord::TestCase(_) => {
                fields.insert("created_by".into(), owner.user_id.clone().into());
                if let Some(story) = &owner.user_story_id {
                    fields.insert("user_story".into(), story.clone().into());
                }
            }
        }
        fields.insert("run_id".into(), run_id.to_string().into());
        fields.insert("chunk_index".into(), FieldValue::Integer(chunk_index as i64));
        fields
    }

    /// Persist every record, returning what was written and what was not
    pub async fn persist(
        &self,
        records: &[SourcedRecord],
        owner: &OwnerMetadata,
        run_id: RunId,
    ) -> PersistReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (position, sourced) in records.iter().enumerate() {
            let kind = sourced.record.kind();
            let collection = kind.collection();
            let chunk_index = sourced.chunk_index;
            let headline = sourced.record.headline().to_string();
            let fields = Self::fields_for(&sourced.record, owner, run_id, chunk_index);
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        let write = tokio::task::spawn_blocking(move || -> Result<RecordId, String> {
                            ExtractionSchema::for_kind(kind).check_required(&fields)?;
                            store.create(collection, &fields).map_err(|e| e.to_string())
                        });
                        match write.await {
                            Ok(result) => result,
                            Err(e) => Err(format!("write task failed: {}", e)),
                        }
                    }
                    Err(e) => Err(format!("write slot unavailable: {}", e)),
                };
                (position, chunk_index, collection, headline, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(records.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Persist task failed to join: {}", e),
            }
        }
        outcomes.sort_by_key(|(position, ..)| *position);

        let mut report = PersistReport::default();
        for (_, chunk_index, collection, headline, outcome) in outcomes {
            match outcome {
                Ok(record_id) => {
                    debug!("Persisted {} '{}' as {}", collection, headline, record_id);
                    report.persisted.push(PersistedRecord {
                        chunk_index,
                        collection,
                        record_id,
                        headline,
                    });
                }
                Err(reason) => {
                    warn!("Failed to persist {} '{}': {}", collection, headline, reason);
                    report.failures.push(PersistFailure {
                        chunk_index,
                        headline,
                        reason,
                    });
                }
            }
        }

        report
    }
}
