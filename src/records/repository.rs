use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::validation::{ValidationError, ValidationErrors};
use super::{Record, RecordBackend};
use crate::error::{AppError, StorageError};

/// Typed CRUD over a [`RecordBackend`]. Stored JSON is normalized into the
/// record type on every read.
#[derive(Clone)]
pub struct RecordRepository {
    backend: Arc<dyn RecordBackend>,
}

impl RecordRepository {
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Validate and persist. A nil id is replaced with a fresh one.
    pub async fn create<T: Record>(&self, mut record: T) -> Result<T, AppError> {
        if record.id().is_nil() {
            record.set_id(Uuid::new_v4());
        }
        record.validate()?;

        let existing = self.list::<T>().await?;
        if existing.iter().any(|other| other.id() == record.id()) {
            return Err(ValidationErrors::single(ValidationError::new(
                "id",
                format!("A {} with id {} already exists", T::KIND, record.id()),
            ))
            .into());
        }
        record.check_conflicts(&existing)?;

        self.backend
            .insert(T::KIND, record.id(), encode(&record)?)
            .await
            .map_err(conflict_as_validation)?;
        log::info!("Created {} {}", T::KIND, record.id());
        Ok(record)
    }

    pub async fn get<T: Record>(&self, id: Uuid) -> Result<T, AppError> {
        match self.backend.fetch(T::KIND, id).await? {
            Some(body) => Ok(decode::<T>(id, body)?),
            None => Err(AppError::not_found(T::KIND.key(), id)),
        }
    }

    pub async fn list<T: Record>(&self) -> Result<Vec<T>, AppError> {
        let rows = self.backend.fetch_all(T::KIND).await?;
        let records = rows
            .into_iter()
            .map(|(id, body)| decode::<T>(id, body))
            .collect::<Result<Vec<T>, StorageError>>()?;
        Ok(records)
    }

    /// Merge `patch` over the stored record and re-validate the result.
    /// The id cannot be changed.
    pub async fn update<T: Record>(&self, id: Uuid, patch: Map<String, Value>) -> Result<T, AppError> {
        let current: T = self.get(id).await?;

        let mut merged = encode(&current)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }

        let mut updated: T = serde_json::from_value(merged).map_err(|e| {
            ValidationErrors::single(ValidationError::new("body", format!("Invalid update: {}", e)))
        })?;
        updated.set_id(id);
        updated.validate()?;

        let others: Vec<T> = self
            .list::<T>()
            .await?
            .into_iter()
            .filter(|other| other.id() != id)
            .collect();
        updated.check_conflicts(&others)?;

        let replaced = self
            .backend
            .replace(T::KIND, id, encode(&updated)?)
            .await
            .map_err(conflict_as_validation)?;
        if !replaced {
            return Err(AppError::not_found(T::KIND.key(), id));
        }
        log::info!("Updated {} {}", T::KIND, id);
        Ok(updated)
    }

    pub async fn delete<T: Record>(&self, id: Uuid) -> Result<(), AppError> {
        if !self.backend.remove(T::KIND, id).await? {
            return Err(AppError::not_found(T::KIND.key(), id));
        }
        log::info!("Deleted {} {}", T::KIND, id);
        Ok(())
    }
}

/// A write that lost a race with another writer reports the same error as the
/// pre-check would have.
fn conflict_as_validation(err: StorageError) -> AppError {
    match err {
        StorageError::Conflict {
            field: "email",
            value,
            ..
        } => ValidationErrors::single(ValidationError::duplicate_email("email", &value)).into(),
        StorageError::Conflict { kind, field, value } => ValidationErrors::single(
            ValidationError::new(field, format!("A {} with {} {} already exists", kind, field, value)),
        )
        .into(),
        other => other.into(),
    }
}

fn encode<T: Record>(record: &T) -> Result<Value, StorageError> {
    serde_json::to_value(record).map_err(|e| StorageError::Encode {
        kind: T::KIND.key(),
        reason: e.to_string(),
    })
}

/// The row key wins over any id stored inside the body.
fn decode<T: Record>(id: Uuid, body: Value) -> Result<T, StorageError> {
    let mut record: T = serde_json::from_value(body).map_err(|e| StorageError::Corrupt {
        kind: T::KIND.key(),
        id: id.to_string(),
        reason: e.to_string(),
    })?;
    record.set_id(id);
    Ok(record)
}
