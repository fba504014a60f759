//! PDF rendering for certificates and service reports.

pub mod assets;
pub mod certificate;
pub mod common;
pub mod page;
pub mod pdf;
pub mod service;
pub mod table;
pub mod text;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

pub use assets::{AssetLoadError, AssetStore, Letterhead};
use page::Page;

use crate::records::model::DocumentRecord;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    #[error("PDF encoding failed: {0}")]
    Encode(String),
    #[error("render task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
    pub page_count: usize,
}

pub fn layout_document(record: &DocumentRecord, generated_at: NaiveDateTime) -> Vec<Page> {
    match record {
        DocumentRecord::Certificate(certificate) => certificate::layout(certificate, generated_at),
        DocumentRecord::Service(report) => service::layout(report, generated_at),
    }
}

/// Lay out and encode a record synchronously with an already loaded letterhead.
pub fn render_with(
    record: &DocumentRecord,
    letterhead: &Letterhead,
    generated_at: NaiveDateTime,
) -> Result<RenderedDocument, RenderError> {
    let pages = layout_document(record, generated_at);
    let title = match record {
        DocumentRecord::Certificate(_) => certificate::TITLE,
        DocumentRecord::Service(_) => service::TITLE,
    };
    let pdf = pdf::encode(&pages, letterhead, &format!("{} {}", title, record.code()))?;
    Ok(RenderedDocument {
        filename: common::document_filename(record),
        pdf,
        page_count: pages.len(),
    })
}

#[derive(Clone)]
pub struct DocumentRenderer {
    assets: AssetStore,
}

impl DocumentRenderer {
    pub fn new(assets: AssetStore) -> Self {
        Self { assets }
    }

    pub async fn render(&self, record: &DocumentRecord) -> Result<RenderedDocument, RenderError> {
        self.render_at(record, Local::now().naive_local()).await
    }

    /// Layout and encoding are CPU bound, so they run on the blocking pool.
    pub async fn render_at(
        &self,
        record: &DocumentRecord,
        generated_at: NaiveDateTime,
    ) -> Result<RenderedDocument, RenderError> {
        let letterhead = self.assets.letterhead().await?;
        let record = record.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            render_with(&record, &letterhead, generated_at)
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        log::info!(
            "Rendered {} ({} page(s), {} bytes)",
            rendered.filename,
            rendered.page_count,
            rendered.pdf.len()
        );
        Ok(rendered)
    }
}
