//! Record backends: a JSONB table in Postgres and an in-process map.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::StorageError;
use crate::records::{RecordBackend, RecordKind};

/// Name of the partial unique index on contact emails.
const CONTACT_EMAIL_INDEX: &str = "idx_records_contact_email";

/// The normalized email a contact row is unique on.
fn contact_email(body: &Value) -> Option<String> {
    body.get("email")
        .and_then(Value::as_str)
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
}

fn write_error(kind: RecordKind, id: Uuid, email: Option<String>, err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some(CONTACT_EMAIL_INDEX) => StorageError::Conflict {
                    kind: kind.key(),
                    field: "email",
                    value: email.unwrap_or_default(),
                },
                _ => StorageError::Conflict {
                    kind: kind.key(),
                    field: "id",
                    value: id.to_string(),
                },
            };
        }
    }
    StorageError::Database(err)
}

pub struct PgRecordBackend {
    pool: PgPool,
}

impl PgRecordBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordBackend for PgRecordBackend {
    async fn insert(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<(), StorageError> {
        let email = contact_email(&body);
        sqlx::query("INSERT INTO records (kind, id, body) VALUES ($1, $2, $3)")
            .bind(kind.key())
            .bind(id)
            .bind(Json(body))
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(kind, id, email, e))?;
        Ok(())
    }

    async fn fetch(&self, kind: RecordKind, id: Uuid) -> Result<Option<Value>, StorageError> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT body FROM records WHERE kind = $1 AND id = $2")
                .bind(kind.key())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(body),)| body))
    }

    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<(Uuid, Value)>, StorageError> {
        let rows: Vec<(Uuid, Json<Value>)> =
            sqlx::query_as("SELECT id, body FROM records WHERE kind = $1 ORDER BY created_at, id")
                .bind(kind.key())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id, Json(body))| (id, body)).collect())
    }

    async fn replace(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<bool, StorageError> {
        let email = contact_email(&body);
        let result = sqlx::query(
            "UPDATE records SET body = $3, updated_at = NOW() WHERE kind = $1 AND id = $2",
        )
        .bind(kind.key())
        .bind(id)
        .bind(Json(body))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(kind, id, email, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, kind: RecordKind, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM records WHERE kind = $1 AND id = $2")
            .bind(kind.key())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct MemoryRecordBackend {
    rows: RwLock<HashMap<RecordKind, Vec<(Uuid, Value)>>>,
}

impl MemoryRecordBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Mirrors the Postgres contact email index. Runs under the write lock.
fn check_unique(
    kind: RecordKind,
    bucket: &[(Uuid, Value)],
    id: Uuid,
    body: &Value,
) -> Result<(), StorageError> {
    if kind != RecordKind::Contact {
        return Ok(());
    }
    let Some(email) = contact_email(body) else {
        return Ok(());
    };
    let taken = bucket
        .iter()
        .any(|(other, stored)| *other != id && contact_email(stored).as_deref() == Some(email.as_str()));
    if taken {
        return Err(StorageError::Conflict {
            kind: kind.key(),
            field: "email",
            value: email,
        });
    }
    Ok(())
}

#[async_trait]
impl RecordBackend for MemoryRecordBackend {
    async fn insert(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<(), StorageError> {
        let mut rows = self.rows.write();
        let bucket = rows.entry(kind).or_default();
        if bucket.iter().any(|(existing, _)| *existing == id) {
            return Err(StorageError::Conflict {
                kind: kind.key(),
                field: "id",
                value: id.to_string(),
            });
        }
        check_unique(kind, bucket, id, &body)?;
        bucket.push((id, body));
        Ok(())
    }

    async fn fetch(&self, kind: RecordKind, id: Uuid) -> Result<Option<Value>, StorageError> {
        Ok(self.rows.read().get(&kind).and_then(|bucket| {
            bucket
                .iter()
                .find(|(existing, _)| *existing == id)
                .map(|(_, body)| body.clone())
        }))
    }

    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<(Uuid, Value)>, StorageError> {
        Ok(self.rows.read().get(&kind).cloned().unwrap_or_default())
    }

    async fn replace(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<bool, StorageError> {
        let mut rows = self.rows.write();
        let Some(bucket) = rows.get_mut(&kind) else {
            return Ok(false);
        };
        if !bucket.iter().any(|(existing, _)| *existing == id) {
            return Ok(false);
        }
        check_unique(kind, bucket, id, &body)?;
        match bucket.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, stored)) => {
                *stored = body;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, kind: RecordKind, id: Uuid) -> Result<bool, StorageError> {
        let mut rows = self.rows.write();
        let Some(bucket) = rows.get_mut(&kind) else {
            return Ok(false);
        };
        let before = bucket.len();
        bucket.retain(|(existing, _)| *existing != id);
        Ok(bucket.len() != before)
    }
}
