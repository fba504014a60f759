//! Shared helpers for document rendering.

use chrono::{NaiveDate, NaiveDateTime};

use crate::records::model::DocumentRecord;

/// Lowercase, with every character outside `[a-z0-9]` replaced by `_`.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if !trimmed.chars().any(|ch| ch.is_ascii_alphanumeric()) {
        return fallback.to_string();
    }
    trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `{kind}-{customer}-{code}.pdf`, stable for a given record.
pub fn document_filename(record: &DocumentRecord) -> String {
    let kind = match record {
        DocumentRecord::Certificate(_) => "certificate",
        DocumentRecord::Service(_) => "service",
    };
    format!(
        "{}-{}-{}.pdf",
        kind,
        sanitize_filename(record.customer_name(), "customer"),
        sanitize_filename(record.code(), "draft")
    )
}

/// `DD - MM - YYYY`
pub fn format_certificate_date(date: NaiveDate) -> String {
    date.format("%d - %m - %Y").to_string()
}

/// `DD-MM-YYYY`
pub fn format_service_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

pub fn format_generated_on(at: NaiveDateTime) -> String {
    at.format("%d/%m/%Y, %H:%M:%S").to_string()
}

pub fn format_report_generated_on(at: NaiveDateTime) -> String {
    at.format("%d-%m-%Y %H:%M:%S").to_string()
}
