//! Service / calibration / installation job report layout.

use chrono::NaiveDateTime;

use super::common::{format_report_generated_on, format_service_date};
use super::page::{
    stamp_footer, Align, DrawOp, FieldStyle, Frame, Layout, Page, PageGeometry, Rgb, TextStyle,
    PAGE_WIDTH,
};
use super::table::{draw_table, Column, TableStyle};
use super::text::FontFace;
use crate::records::model::ServiceReport;

pub const TITLE: &str = "SERVICE / CALIBRATION / INSTALLATION JOB REPORT";
pub const NO_REPORT: &str = "No report provided";
pub const NO_REMARKS: &str = "No engineer remarks available";

const GEOMETRY: PageGeometry = PageGeometry {
    left_margin: 15.0,
    content_width: 180.0,
    content_top: 40.0,
    content_bottom: 267.0,
    logo: Frame {
        x: 5.0,
        y: 5.0,
        width: 50.0,
        height: 15.0,
    },
};

const FOOTER: Frame = Frame {
    x: 15.0,
    y: 277.0,
    width: 180.0,
    height: 15.0,
};

/// Sits between the content area and the footer image.
const GENERATED_ON_Y: f32 = 272.0;

const ACCENT: Rgb = Rgb(0, 51, 153);
const HEADING: TextStyle = TextStyle::new(FontFace::Bold, 10.0);
const BOX_TEXT: TextStyle = TextStyle::new(FontFace::Regular, 9.0);
const BOX_LINE_HEIGHT: f32 = 6.0;
const BOX_PADDING: f32 = 5.0;

const FIELDS: FieldStyle = FieldStyle {
    label_x: 15.0,
    value_x: 80.0,
    value_width: 115.0,
    label: TextStyle::new(FontFace::Bold, 10.0),
    value: TextStyle::new(FontFace::Regular, 10.0).with_color(Rgb::gray(50)),
    line_height: 6.0,
    label_suffix: ":",
    value_prefix: "",
};

const REMARK_COLUMNS: [Column; 7] = [
    Column {
        header: "Sr. No.",
        width: 15.0,
        align: Align::Center,
    },
    Column {
        header: "Service/Spares",
        width: 50.0,
        align: Align::Left,
    },
    Column {
        header: "Part No.",
        width: 25.0,
        align: Align::Left,
    },
    Column {
        header: "Rate",
        width: 20.0,
        align: Align::Left,
    },
    Column {
        header: "Quantity",
        width: 20.0,
        align: Align::Left,
    },
    Column {
        header: "Total",
        width: 25.0,
        align: Align::Left,
    },
    Column {
        header: "PO No.",
        width: 25.0,
        align: Align::Left,
    },
];

const REMARK_TABLE: TableStyle = TableStyle {
    header_height: 8.0,
    header_text: TextStyle::new(FontFace::Bold, 9.0),
    header_border: 0.5,
    body_text: TextStyle::new(FontFace::Regular, 9.0),
    body_border: 0.2,
    line_height: 7.0,
    row_padding: 0.0,
};

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        NO_REPORT
    } else {
        text
    }
}

/// Heading followed by a boxed paragraph, kept together with its first line.
fn report_box(layout: &mut Layout, heading: &str, text: &str) {
    layout.ensure_space(BOX_PADDING + BOX_LINE_HEIGHT + BOX_PADDING);
    let y = layout.y();
    layout.text(GEOMETRY.left_margin, y, heading, HEADING);
    layout.advance(5.0);
    layout.boxed_paragraph(or_placeholder(text), BOX_TEXT, BOX_LINE_HEIGHT, BOX_PADDING);
}

pub fn layout(report: &ServiceReport, generated_at: NaiveDateTime) -> Vec<Page> {
    let mut layout = Layout::new(GEOMETRY);

    let y = layout.y();
    layout.text_aligned(
        PAGE_WIDTH / 2.0,
        y,
        TITLE,
        TextStyle::new(FontFace::Bold, 13.0).with_color(ACCENT),
        Align::Center,
    );
    layout.advance(10.0);

    let date = format_service_date(report.date);
    let status = report.status.to_string();
    for (label, value) in [
        ("Report No.", report.report_no.as_str()),
        ("Customer Name", report.customer_name.as_str()),
        ("Customer Location", report.customer_location.as_str()),
        ("Contact Person", report.contact_person.as_str()),
        ("Status", status.as_str()),
        ("Contact Number", report.contact_number.as_str()),
        ("Service Engineer", report.service_engineer.as_str()),
        ("Date", date.as_str()),
        ("Place", report.place.as_str()),
        ("Place Options", report.place_options.as_str()),
        ("Nature of Job", report.nature_of_job.as_str()),
        ("Make & Model Number", report.instrument_make_model_quantity.as_str()),
    ] {
        layout.field_row(label, value, &FIELDS);
    }
    layout.advance(5.0);
    layout.field_row("Calibrated & Tested OK", &report.calibrated_ok_serials, &FIELDS);
    layout.field_row("Sr.No Faulty/Non-Working", &report.faulty_serials, &FIELDS);
    layout.advance(10.0);

    report_box(&mut layout, "Engineer Report:", &report.engineer_report);
    layout.advance(5.0);

    layout.ensure_space(8.0 + REMARK_TABLE.header_height + REMARK_TABLE.line_height);
    let y = layout.y();
    layout.text(GEOMETRY.left_margin, y, "ENGINEER REMARKS", HEADING);
    layout.advance(8.0);

    if report.engineer_remarks.is_empty() {
        let y = layout.y();
        layout.text(
            GEOMETRY.left_margin,
            y,
            NO_REMARKS,
            TextStyle::new(FontFace::Italic, 9.0).with_color(Rgb::gray(150)),
        );
        layout.advance(10.0);
    } else {
        let rows: Vec<Vec<String>> = report
            .engineer_remarks
            .iter()
            .enumerate()
            .map(|(i, remark)| {
                vec![
                    (i + 1).to_string(),
                    remark.service_spares.clone(),
                    remark.part_no.clone(),
                    remark.rate.clone(),
                    remark.quantity.clone(),
                    remark.total.clone(),
                    remark.po_no.clone(),
                ]
            })
            .collect();
        draw_table(&mut layout, &REMARK_COLUMNS, &rows, &REMARK_TABLE);
    }
    layout.advance(10.0);

    report_box(&mut layout, "Customer Remarks:", &report.customer_report);

    layout.ensure_space(40.0);
    layout.advance(30.0);
    let y = layout.y();
    let right = GEOMETRY.right_edge();
    layout.text(GEOMETRY.left_margin, y, "Customer Name,Seal & Sign", HEADING);
    layout.text_aligned(right, y, "Service Engineer,Seal & Sign", HEADING, Align::Right);
    layout.text_aligned(
        right,
        y + 5.0,
        &report.engineer_name,
        TextStyle::new(FontFace::Regular, 10.0),
        Align::Right,
    );
    layout.advance(10.0);

    let mut pages = layout.into_pages();
    stamp_footer(&mut pages, FOOTER);
    if let Some(last) = pages.last_mut() {
        last.ops.push(DrawOp::Text {
            x: GEOMETRY.left_margin,
            y: GENERATED_ON_Y,
            text: format!(
                "Report Generated On: {}",
                format_report_generated_on(generated_at)
            ),
            style: TextStyle::new(FontFace::Regular, 9.0).with_color(Rgb::gray(100)),
        });
    }
    pages
}
