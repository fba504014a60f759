//! Business records and their persistence contract.

pub mod handlers;
pub mod model;
pub mod normalize;
pub mod repository;
pub mod validation;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::error::StorageError;
use model::{
    Certificate, Company, ContactPerson, Engineer, InstrumentModel, ServiceEngineer, ServiceReport,
};
use validation::{ValidationErrors, Validator};

pub use repository::RecordRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Company,
    Contact,
    Model,
    Engineer,
    ServiceEngineer,
    Certificate,
    Service,
}

impl RecordKind {
    /// Key stored in the `records.kind` column.
    pub fn key(self) -> &'static str {
        match self {
            RecordKind::Company => "company",
            RecordKind::Contact => "contact",
            RecordKind::Model => "model",
            RecordKind::Engineer => "engineer",
            RecordKind::ServiceEngineer => "service_engineer",
            RecordKind::Certificate => "certificate",
            RecordKind::Service => "service",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw JSON storage keyed by kind and id.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn insert(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<(), StorageError>;

    async fn fetch(&self, kind: RecordKind, id: Uuid) -> Result<Option<Value>, StorageError>;

    /// All rows of a kind in insertion order.
    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<(Uuid, Value)>, StorageError>;

    /// Returns `false` when no row matched.
    async fn replace(&self, kind: RecordKind, id: Uuid, body: Value) -> Result<bool, StorageError>;

    /// Returns `false` when no row matched.
    async fn remove(&self, kind: RecordKind, id: Uuid) -> Result<bool, StorageError>;
}

/// A typed record the repository can store.
pub trait Record: Serialize + DeserializeOwned + Validator + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    /// Cross-record rules, checked against every other stored record of the
    /// same kind.
    fn check_conflicts(&self, _others: &[Self]) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: RecordKind = $kind;

            fn id(&self) -> Uuid {
                self.id
            }

            fn set_id(&mut self, id: Uuid) {
                self.id = id;
            }
        }
    };
}

impl_record!(Company, RecordKind::Company);
impl_record!(InstrumentModel, RecordKind::Model);
impl_record!(Engineer, RecordKind::Engineer);
impl_record!(ServiceEngineer, RecordKind::ServiceEngineer);
impl_record!(Certificate, RecordKind::Certificate);
impl_record!(ServiceReport, RecordKind::Service);

impl Record for ContactPerson {
    const KIND: RecordKind = RecordKind::Contact;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn check_conflicts(&self, others: &[Self]) -> Result<(), ValidationErrors> {
        self.check_unique_email(others)
    }
}
