//! Sequential document numbering.
//!
//! One counter row per [`DocumentType`] holds the last committed ordinal.
//! The [`allocator::SequenceAllocator`] previews or commits the next number
//! against any [`SequenceStore`] backend.

pub mod allocator;
pub mod format;
pub mod handlers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::StorageError;

pub use allocator::{fallback_allocation, SequenceAllocator};
pub use format::{fiscal_year_label, format_document_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Certificate,
    Service,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::Certificate, DocumentType::Service];

    /// Counter row key.
    pub fn key(self) -> &'static str {
        match self {
            DocumentType::Certificate => "certificate",
            DocumentType::Service => "service",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            DocumentType::Certificate => "CER",
            DocumentType::Service => "SER",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    pub document_type: DocumentType,
    pub last_number: u64,
    /// Last formatted code, kept for auditing only.
    pub last_issued_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AllocationResult {
    pub code: String,
    pub ordinal: u64,
}

/// Durable storage of the per-type counters.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Current counter row, `None` when no number was ever committed.
    async fn read(&self, document_type: DocumentType)
        -> Result<Option<SequenceCounter>, StorageError>;

    /// Atomically bump the counter (creating it at 1 when absent) and record
    /// `code_for(new_ordinal)` as the last issued code.
    async fn increment(
        &self,
        document_type: DocumentType,
        code_for: &(dyn Fn(u64) -> String + Send + Sync),
    ) -> Result<SequenceCounter, StorageError>;
}
