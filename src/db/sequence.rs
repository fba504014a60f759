//! Sequence store backends: Postgres and in-process.

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::StorageError;
use crate::numbering::{DocumentType, SequenceCounter, SequenceStore};

pub struct PgSequenceStore {
    pool: PgPool,
}

impl PgSequenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_ordinal(value: i64) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| StorageError::CounterRange(value))
}

#[async_trait]
impl SequenceStore for PgSequenceStore {
    async fn read(
        &self,
        document_type: DocumentType,
    ) -> Result<Option<SequenceCounter>, StorageError> {
        let row: Option<(i64, Option<String>)> = sqlx::query_as(
            "SELECT last_number, last_issued_code FROM document_sequences WHERE document_type = $1",
        )
        .bind(document_type.key())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(last_number, last_issued_code)| {
            Ok(SequenceCounter {
                document_type,
                last_number: to_ordinal(last_number)?,
                last_issued_code,
            })
        })
        .transpose()
    }

    async fn increment(
        &self,
        document_type: DocumentType,
        code_for: &(dyn Fn(u64) -> String + Send + Sync),
    ) -> Result<SequenceCounter, StorageError> {
        let mut tx = self.pool.begin().await?;

        // The upsert takes the row lock; concurrent commits queue behind it.
        let last_number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_sequences (document_type, last_number)
            VALUES ($1, 1)
            ON CONFLICT (document_type)
            DO UPDATE SET last_number = document_sequences.last_number + 1, updated_at = NOW()
            RETURNING last_number
            "#,
        )
        .bind(document_type.key())
        .fetch_one(&mut *tx)
        .await?;

        let ordinal = to_ordinal(last_number)?;
        let code = code_for(ordinal);

        sqlx::query("UPDATE document_sequences SET last_issued_code = $2 WHERE document_type = $1")
            .bind(document_type.key())
            .bind(&code)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SequenceCounter {
            document_type,
            last_number: ordinal,
            last_issued_code: Some(code),
        })
    }
}

/// Counters kept in process memory. Used when no database is configured and
/// in tests.
#[derive(Default)]
pub struct MemorySequenceStore {
    counters: Mutex<HashMap<DocumentType, SequenceCounter>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose counter for `document_type` already stands at `last_number`.
    pub fn with_counter(document_type: DocumentType, last_number: u64) -> Self {
        let store = Self::new();
        store.counters.lock().insert(
            document_type,
            SequenceCounter {
                document_type,
                last_number,
                last_issued_code: None,
            },
        );
        store
    }

    pub fn snapshot(&self, document_type: DocumentType) -> Option<SequenceCounter> {
        self.counters.lock().get(&document_type).cloned()
    }
}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn read(
        &self,
        document_type: DocumentType,
    ) -> Result<Option<SequenceCounter>, StorageError> {
        Ok(self.snapshot(document_type))
    }

    async fn increment(
        &self,
        document_type: DocumentType,
        code_for: &(dyn Fn(u64) -> String + Send + Sync),
    ) -> Result<SequenceCounter, StorageError> {
        let mut counters = self.counters.lock();
        let counter = counters
            .entry(document_type)
            .or_insert_with(|| SequenceCounter {
                document_type,
                last_number: 0,
                last_issued_code: None,
            });

        let next = counter
            .last_number
            .checked_add(1)
            .ok_or(StorageError::CounterRange(i64::MAX))?;
        counter.last_number = next;
        counter.last_issued_code = Some(code_for(next));
        Ok(counter.clone())
    }
}
