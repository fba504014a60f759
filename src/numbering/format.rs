//! Document code formatting: `RPS/{prefix}/{YY}-{YY2}/{0000}`.

use chrono::{Datelike, NaiveDate};

use super::DocumentType;

/// Minimum width of the ordinal part; wider ordinals are kept whole.
const ORDINAL_WIDTH: usize = 4;

/// Two-digit year-pair label for the window that starts in the calendar
/// year of `issue_date`. The month is ignored.
pub fn fiscal_year_label(issue_date: NaiveDate) -> String {
    let year = issue_date.year();
    format!(
        "{:02}-{:02}",
        year.rem_euclid(100),
        (year + 1).rem_euclid(100)
    )
}

pub fn format_document_code(
    document_type: DocumentType,
    issue_date: NaiveDate,
    ordinal: u64,
) -> String {
    format!(
        "RPS/{}/{}/{:0width$}",
        document_type.prefix(),
        fiscal_year_label(issue_date),
        ordinal,
        width = ORDINAL_WIDTH
    )
}
