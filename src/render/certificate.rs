//! Calibration certificate layout.

use chrono::NaiveDateTime;

use super::common::{format_certificate_date, format_generated_on};
use super::page::{
    stamp_footer, Align, DrawOp, FieldStyle, Frame, Layout, Page, PageGeometry, Rgb, TextStyle,
    PAGE_WIDTH,
};
use super::table::{draw_table, Column, TableStyle};
use super::text::{wrap_text, FontFace};
use crate::records::model::Certificate;

pub const TITLE: &str = "CALIBRATION CERTIFICATE";
pub const CONCLUSION: &str = "The above-mentioned Gas Detector was calibrated successfully, and the result confirms that the performance of the instrument is within acceptable limits.";
pub const DISCLAIMER: &str =
    "This certificate is electronically generated and does not require a physical signature.";

const GEOMETRY: PageGeometry = PageGeometry {
    left_margin: 15.0,
    content_width: 180.0,
    content_top: 40.0,
    content_bottom: 277.0,
    logo: Frame {
        x: 2.0,
        y: 10.0,
        width: 60.0,
        height: 20.0,
    },
};

const FOOTER: Frame = Frame {
    x: 15.0,
    y: 277.0,
    width: 180.0,
    height: 15.0,
};

/// Baseline of the disclaimer on the last page; content must end above it.
const DISCLAIMER_Y: f32 = 266.0;
const TRAILER_GAP: f32 = 5.0;

const ACCENT: Rgb = Rgb(0, 51, 102);

const FIELDS: FieldStyle = FieldStyle {
    label_x: 15.0,
    value_x: 72.0,
    value_width: 115.0,
    label: TextStyle::new(FontFace::Bold, 11.0),
    value: TextStyle::new(FontFace::Regular, 11.0).with_color(Rgb::gray(50)),
    line_height: 8.0,
    label_suffix: "",
    value_prefix: ": ",
};

const OBSERVATION_COLUMNS: [Column; 4] = [
    Column {
        header: "Sr. No.",
        width: 20.0,
        align: Align::Center,
    },
    Column {
        header: "Concentration of Gas",
        width: 70.0,
        align: Align::Left,
    },
    Column {
        header: "Reading Before",
        width: 40.0,
        align: Align::Left,
    },
    Column {
        header: "Reading After",
        width: 40.0,
        align: Align::Left,
    },
];

const OBSERVATION_TABLE: TableStyle = TableStyle {
    header_height: 8.0,
    header_text: TextStyle::new(FontFace::Bold, 10.0),
    header_border: 0.5,
    body_text: TextStyle::new(FontFace::Regular, 10.0),
    body_border: 0.2,
    line_height: 7.0,
    row_padding: 0.0,
};

pub fn layout(certificate: &Certificate, generated_at: NaiveDateTime) -> Vec<Page> {
    let mut layout = Layout::new(GEOMETRY);

    let y = layout.y();
    layout.text_aligned(
        PAGE_WIDTH / 2.0,
        y,
        TITLE,
        TextStyle::new(FontFace::Bold, 16.0).with_color(ACCENT),
        Align::Center,
    );
    layout.advance(12.0);

    for (label, value) in [
        ("Certificate No.", certificate.certificate_no.as_str()),
        ("Customer Name", certificate.customer_name.as_str()),
        ("Site Location", certificate.site_location.as_str()),
        ("Make & Model", certificate.make_model.as_str()),
        ("Range", certificate.range.as_str()),
        ("Serial No.", certificate.serial_no.as_str()),
        ("Calibration Gas", certificate.calibration_gas.as_str()),
        ("Gas Canister Details", certificate.gas_canister_details.as_str()),
    ] {
        layout.field_row(label, value, &FIELDS);
    }
    layout.advance(5.0);

    layout.field_row(
        "Date of Calibration",
        &format_certificate_date(certificate.date_of_calibration),
        &FIELDS,
    );
    layout.field_row(
        "Calibration Due Date",
        &format_certificate_date(certificate.calibration_due_date),
        &FIELDS,
    );
    layout.field_row("Status", &certificate.status.to_string(), &FIELDS);
    layout.advance(5.0);

    layout.ensure_space(10.0);
    let y = layout.y();
    layout.rule(GEOMETRY.left_margin, GEOMETRY.right_edge(), y, 0.3, Rgb::gray(180));
    layout.advance(10.0);

    layout.ensure_space(10.0 + OBSERVATION_TABLE.header_height + 8.0);
    let y = layout.y();
    layout.text(
        GEOMETRY.left_margin,
        y,
        "OBSERVATIONS",
        TextStyle::new(FontFace::Bold, 12.0).with_color(ACCENT),
    );
    layout.advance(10.0);

    let rows: Vec<Vec<String>> = certificate
        .observations
        .iter()
        .enumerate()
        .map(|(i, observation)| {
            vec![
                (i + 1).to_string(),
                observation.gas.clone(),
                observation.before.clone(),
                observation.after.clone(),
            ]
        })
        .collect();
    draw_table(&mut layout, &OBSERVATION_COLUMNS, &rows, &OBSERVATION_TABLE);
    layout.advance(10.0);

    let conclusion_style = TextStyle::new(FontFace::Regular, 10.0);
    let lines = wrap_text(CONCLUSION, conclusion_style.face, conclusion_style.size, GEOMETRY.content_width);
    let height = lines.len() as f32 * 6.0;
    layout.ensure_space(height + 10.0);
    let y = layout.y();
    for (i, line) in lines.into_iter().enumerate() {
        layout.text(GEOMETRY.left_margin, y + i as f32 * 6.0, line, conclusion_style);
    }
    layout.advance(height + 10.0);

    layout.ensure_space(12.0);
    let y = layout.y();
    let right = GEOMETRY.right_edge();
    layout.text_aligned(
        right,
        y,
        "Tested & Calibrated By",
        TextStyle::new(FontFace::Bold, 11.0),
        Align::Right,
    );
    layout.text_aligned(
        right,
        y + 8.0,
        &certificate.engineer_name,
        TextStyle::new(FontFace::Regular, 11.0),
        Align::Right,
    );
    layout.advance(12.0);

    if layout.y() > DISCLAIMER_Y - TRAILER_GAP {
        layout.new_page();
    }

    let mut pages = layout.into_pages();
    stamp_footer(&mut pages, FOOTER);
    if let Some(last) = pages.last_mut() {
        stamp_disclaimer(last, generated_at);
    }
    pages
}

fn stamp_disclaimer(page: &mut Page, generated_at: NaiveDateTime) {
    let style = TextStyle::new(FontFace::Regular, 8.0).with_color(Rgb::gray(100));
    page.ops.push(DrawOp::Text {
        x: GEOMETRY.left_margin,
        y: DISCLAIMER_Y,
        text: DISCLAIMER.to_string(),
        style,
    });
    page.ops.push(DrawOp::Text {
        x: GEOMETRY.left_margin,
        y: DISCLAIMER_Y + 5.0,
        text: format!("Generated on: {}", format_generated_on(generated_at)),
        style,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::model::{CertificateStatus, Observation};
    use crate::render::page::ImageSlot;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn certificate(observations: usize) -> Certificate {
        Certificate {
            id: Uuid::nil(),
            certificate_no: "RPS/CER/25-26/0007".into(),
            customer_name: "Acme Refinery".into(),
            site_location: "Plant 2".into(),
            make_model: "GasAlert Max XT".into(),
            range: "0-100 %LEL".into(),
            serial_no: "MA218-0042".into(),
            calibration_gas: "Methane".into(),
            gas_canister_details: "Cylinder 4421".into(),
            date_of_calibration: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            calibration_due_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            observations: (0..observations)
                .map(|i| Observation {
                    gas: format!("{} ppm", (i + 1) * 25),
                    before: "48".into(),
                    after: "50".into(),
                })
                .collect(),
            engineer_name: "R. Patil".into(),
            status: CertificateStatus::Checked,
            company_id: None,
            created_at: None,
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn single_page_certificate_has_every_section() {
        let pages = layout(&certificate(5), generated_at());
        assert_eq!(pages.len(), 1);
        let texts = pages[0].texts();
        for expected in [
            TITLE,
            "Certificate No.",
            ": RPS/CER/25-26/0007",
            ": 01 - 06 - 2025",
            "OBSERVATIONS",
            "Concentration of Gas",
            "125 ppm",
            "Tested & Calibrated By",
            "R. Patil",
            DISCLAIMER,
            "Generated on: 01/06/2025, 10:00:00",
        ] {
            assert!(texts.contains(&expected), "missing {expected:?}");
        }
        assert_eq!(pages[0].image_count(ImageSlot::Logo), 1);
        assert_eq!(pages[0].image_count(ImageSlot::Footer), 1);
    }

    #[test]
    fn long_values_push_content_to_a_second_page() {
        let mut long = certificate(5);
        long.gas_canister_details = "Cylinder lot 4421 refilled and certified by the supplier ".repeat(30);
        let pages = layout(&long, generated_at());
        assert!(pages.len() >= 2);
        assert!(pages.iter().all(|p| p.image_count(ImageSlot::Footer) == 1));
        assert!(pages.iter().all(|p| p.image_count(ImageSlot::Logo) == 1));
        let disclaimers = pages.iter().filter(|p| p.texts().contains(&DISCLAIMER)).count();
        assert_eq!(disclaimers, 1);
        assert!(pages.last().unwrap().texts().contains(&DISCLAIMER));
    }
}
