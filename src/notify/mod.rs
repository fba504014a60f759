//! Dispatch of rendered documents to the operational mailbox.
//!
//! Dispatch is a side channel: callers log and report its outcome but always
//! return the rendered document.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, MailRelayConfig};
use crate::numbering::DocumentType;
use crate::records::model::DocumentRecord;
use crate::render::RenderedDocument;

pub const DISPATCH_STATUS_HEADER: &str = "X-Dispatch-Status";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail relay rejected the message with status {0}")]
    Rejected(u16),
    #[error("document dispatch is not configured")]
    NotConfigured,
}

/// What the mailbox needs to know about a rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchMeta {
    pub record_id: Uuid,
    pub document_type: DocumentType,
    pub code: String,
    pub customer_name: String,
}

impl From<&DocumentRecord> for DispatchMeta {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            record_id: record.id(),
            document_type: record.document_type(),
            code: record.code().to_string(),
            customer_name: record.customer_name().to_string(),
        }
    }
}

impl DispatchMeta {
    pub fn subject(&self) -> String {
        let label = match self.document_type {
            DocumentType::Certificate => "Calibration Certificate",
            DocumentType::Service => "Service Report",
        };
        format!("{}: {} - {}", label, self.code, self.customer_name)
    }

    pub fn body_text(&self) -> String {
        let label = match self.document_type {
            DocumentType::Certificate => "calibration certificate",
            DocumentType::Service => "service report",
        };
        format!(
            "Please find attached the {} {} for {}.\n\nRecord ID: {}",
            label, self.code, self.customer_name, self.record_id
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(
        &self,
        document: &RenderedDocument,
        meta: &DispatchMeta,
    ) -> Result<(), NotifyError>;
}

/// Outcome reported to HTTP callers in [`DISPATCH_STATUS_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed,
    Disabled,
}

impl DispatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Disabled => "disabled",
        }
    }

    pub fn from_result(result: &Result<(), NotifyError>) -> Self {
        match result {
            Ok(()) => DispatchStatus::Sent,
            Err(NotifyError::NotConfigured) => DispatchStatus::Disabled,
            Err(_) => DispatchStatus::Failed,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MailAttachment {
    pub filename: String,
    pub content: String,
    pub encoding: &'static str,
    pub content_type: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<MailAttachment>,
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct MailRelayNotifier {
    config: MailRelayConfig,
    client: reqwest::Client,
}

impl MailRelayNotifier {
    pub fn new(config: MailRelayConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn build_message(&self, document: &RenderedDocument, meta: &DispatchMeta) -> MailMessage {
        MailMessage {
            from: self.config.from.clone(),
            to: self.config.recipient.clone(),
            subject: meta.subject(),
            text: meta.body_text(),
            attachments: vec![MailAttachment {
                filename: document.filename.clone(),
                content: BASE64.encode(&document.pdf),
                encoding: "base64",
                content_type: "application/pdf",
            }],
        }
    }

    fn add_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn dispatch(
        &self,
        document: &RenderedDocument,
        meta: &DispatchMeta,
    ) -> Result<(), NotifyError> {
        let message = self.build_message(document, meta);
        let request = self.add_auth(self.client.post(&self.config.endpoint)).json(&message);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        log::info!(
            "Dispatched {} to {} ({})",
            document.filename,
            self.config.recipient,
            meta.code
        );
        Ok(())
    }
}

pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn dispatch(&self, _: &RenderedDocument, _: &DispatchMeta) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Arc<dyn Notifier> {
    match config.mail_relay.clone() {
        Some(relay) => {
            log::info!("Document dispatch enabled, recipient {}", relay.recipient);
            Arc::new(MailRelayNotifier::new(relay, client))
        }
        None => {
            log::info!("Document dispatch disabled");
            Arc::new(DisabledNotifier)
        }
    }
}

/// Dispatch and log the outcome; never fails.
pub async fn dispatch_and_report(
    notifier: &dyn Notifier,
    document: &RenderedDocument,
    meta: &DispatchMeta,
) -> DispatchStatus {
    let result = notifier.dispatch(document, meta).await;
    match &result {
        Ok(()) => {}
        Err(NotifyError::NotConfigured) => {
            log::debug!("Skipping dispatch of {}: not configured", meta.code)
        }
        Err(e) => log::warn!("Dispatch of {} failed: {}", meta.code, e),
    }
    DispatchStatus::from_result(&result)
}
