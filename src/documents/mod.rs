//! Document workflow: number assignment on submit, rendering, dispatch.

pub mod handlers;

use chrono::{Local, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::notify::{self, DispatchMeta, DispatchStatus};
use crate::numbering::{fallback_allocation, DocumentType, SequenceAllocator};
use crate::records::model::{Certificate, DocumentRecord, ServiceReport};
use crate::records::validation::ValidationErrors;
use crate::records::Record;
use crate::render::RenderedDocument;
use crate::AppState;

/// Number shown on a blank form before the document is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DraftNumber {
    pub code: String,
    pub ordinal: u64,
    /// Random stand-in issued while the sequence store is unreachable.
    pub provisional: bool,
}

/// A record that carries a document number and renders to a PDF.
pub trait Document: Record + Into<DocumentRecord> {
    const DOCUMENT_TYPE: DocumentType;

    fn number(&self) -> &str;

    fn set_number(&mut self, number: String);

    /// Validation of everything except the number.
    fn validate_content(&self) -> ValidationErrors;

    /// Fill server-side fields before the first save.
    fn stamp(&mut self) {}
}

impl Document for Certificate {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Certificate;

    fn number(&self) -> &str {
        &self.certificate_no
    }

    fn set_number(&mut self, number: String) {
        self.certificate_no = number;
    }

    fn validate_content(&self) -> ValidationErrors {
        Certificate::validate_content(self)
    }

    fn stamp(&mut self) {
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
    }
}

impl Document for ServiceReport {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Service;

    fn number(&self) -> &str {
        &self.report_no
    }

    fn set_number(&mut self, number: String) {
        self.report_no = number;
    }

    fn validate_content(&self) -> ValidationErrors {
        ServiceReport::validate_content(self)
    }
}

/// Preview the next number. Falls back to a provisional random number when
/// the sequence store fails.
pub async fn draft_number(allocator: &SequenceAllocator, document_type: DocumentType) -> DraftNumber {
    match allocator.allocate(document_type, false).await {
        Ok(result) => DraftNumber {
            code: result.code,
            ordinal: result.ordinal,
            provisional: false,
        },
        Err(e) => {
            let result = fallback_allocation(document_type, Local::now().date_naive());
            log::warn!(
                "Sequence store unavailable for {} draft ({}); using provisional {}",
                document_type,
                e,
                result.code
            );
            DraftNumber {
                code: result.code,
                ordinal: result.ordinal,
                provisional: true,
            }
        }
    }
}

/// Commit a number for a document being saved. A storage failure yields a
/// provisional random number so the save can still go through.
pub async fn assign_number(allocator: &SequenceAllocator, document_type: DocumentType) -> String {
    match allocator.allocate(document_type, true).await {
        Ok(result) => result.code,
        Err(e) => {
            let result = fallback_allocation(document_type, Local::now().date_naive());
            log::warn!(
                "Failed to commit {} number ({}); saving with provisional {}",
                document_type,
                e,
                result.code
            );
            result.code
        }
    }
}

/// Validate, number when the number is blank, and persist.
pub async fn submit<T: Document>(state: &AppState, mut document: T) -> Result<T, AppError> {
    document.validate_content().into_result()?;

    if document.number().trim().is_empty() {
        let code = assign_number(&state.allocator, T::DOCUMENT_TYPE).await;
        document.set_number(code);
    }
    document.stamp();

    state.records.create(document).await
}

pub async fn render_stored<T: Document>(
    state: &AppState,
    id: Uuid,
) -> Result<(RenderedDocument, DocumentRecord), AppError> {
    let record: DocumentRecord = state.records.get::<T>(id).await?.into();
    let rendered = state.renderer.render(&record).await?;
    Ok((rendered, record))
}

/// Render and hand the PDF to the notifier. Dispatch never fails the call.
pub async fn render_and_send<T: Document>(
    state: &AppState,
    id: Uuid,
) -> Result<(RenderedDocument, DispatchStatus), AppError> {
    let (rendered, record) = render_stored::<T>(state, id).await?;
    let meta = DispatchMeta::from(&record);
    let status = notify::dispatch_and_report(state.notifier.as_ref(), &rendered, &meta).await;
    Ok((rendered, status))
}
