use chrono::{Local, NaiveDate};
use rand::Rng;
use std::sync::Arc;

use super::{format_document_code, AllocationResult, DocumentType, SequenceStore};
use crate::error::StorageError;

/// Hands out document numbers from a [`SequenceStore`].
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn SequenceStore>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn SequenceStore>) -> Self {
        Self { store }
    }

    /// Allocate using today's local date for the year window.
    pub async fn allocate(
        &self,
        document_type: DocumentType,
        commit: bool,
    ) -> Result<AllocationResult, StorageError> {
        self.allocate_on(document_type, commit, Local::now().date_naive())
            .await
    }

    /// Peek (`commit == false`) returns the last committed ordinal, or 1 when
    /// the counter does not exist yet, and never writes. Commit persists the
    /// increment and returns the new ordinal.
    pub async fn allocate_on(
        &self,
        document_type: DocumentType,
        commit: bool,
        issue_date: NaiveDate,
    ) -> Result<AllocationResult, StorageError> {
        if commit {
            let counter = self
                .store
                .increment(document_type, &move |ordinal| {
                    format_document_code(document_type, issue_date, ordinal)
                })
                .await?;
            let code = counter.last_issued_code.unwrap_or_else(|| {
                format_document_code(document_type, issue_date, counter.last_number)
            });
            log::info!("Committed {} number {}", document_type, code);
            return Ok(AllocationResult {
                code,
                ordinal: counter.last_number,
            });
        }

        let ordinal = match self.store.read(document_type).await? {
            Some(counter) => counter.last_number,
            None => 1,
        };
        let code = format_document_code(document_type, issue_date, ordinal);
        log::debug!("Peeked {} number {}", document_type, code);
        Ok(AllocationResult { code, ordinal })
    }
}

/// Random pseudo-number used when the store cannot be reached. Not unique.
pub fn fallback_allocation(document_type: DocumentType, issue_date: NaiveDate) -> AllocationResult {
    let ordinal = rand::rng().random_range(1..=9999u64);
    AllocationResult {
        code: format_document_code(document_type, issue_date, ordinal),
        ordinal,
    }
}
