//! Encode laid-out pages as a PDF with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::assets::{Letterhead, RasterImage};
use super::page::{DrawOp, Frame, ImageSlot, Page, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use super::text::{FontFace, MM_PER_PT};
use super::RenderError;

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// PDF y axis points up from the bottom edge.
fn flip(y_mm: f32) -> f32 {
    pt(PAGE_HEIGHT - y_mm)
}

fn image_name(slot: ImageSlot) -> &'static str {
    match slot {
        ImageSlot::Logo => "Im1",
        ImageSlot::Footer => "Im2",
    }
}

fn color_operands(color: Rgb) -> Vec<Object> {
    [color.0, color.1, color.2]
        .into_iter()
        .map(|c| Object::Real(f32::from(c) / 255.0))
        .collect()
}

/// Map text to WinAnsi bytes; anything outside the encoding becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{a0}'..='\u{ff}' => ch as u32 as u8,
            '\u{20ac}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn draw_operations(op: &DrawOp, operations: &mut Vec<Operation>) {
    match op {
        DrawOp::Text { x, y, text, style } => {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![style.face.resource_name().into(), style.size.into()],
            ));
            operations.push(Operation::new("rg", color_operands(style.color)));
            operations.push(Operation::new("Td", vec![pt(*x).into(), flip(*y).into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        DrawOp::Rect { frame, line_width } => {
            operations.push(Operation::new("w", vec![pt(*line_width).into()]));
            operations.push(Operation::new("RG", color_operands(Rgb::BLACK)));
            operations.push(Operation::new(
                "re",
                vec![
                    pt(frame.x).into(),
                    flip(frame.y + frame.height).into(),
                    pt(frame.width).into(),
                    pt(frame.height).into(),
                ],
            ));
            operations.push(Operation::new("S", vec![]));
        }
        DrawOp::Line {
            from,
            to,
            line_width,
            color,
        } => {
            operations.push(Operation::new("w", vec![pt(*line_width).into()]));
            operations.push(Operation::new("RG", color_operands(*color)));
            operations.push(Operation::new("m", vec![pt(from.0).into(), flip(from.1).into()]));
            operations.push(Operation::new("l", vec![pt(to.0).into(), flip(to.1).into()]));
            operations.push(Operation::new("S", vec![]));
        }
        DrawOp::Image { slot, frame } => {
            let Frame {
                x,
                y,
                width,
                height,
            } = *frame;
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    pt(width).into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    pt(height).into(),
                    pt(x).into(),
                    flip(y + height).into(),
                ],
            ));
            operations.push(Operation::new("Do", vec![image_name(*slot).into()]));
            operations.push(Operation::new("Q", vec![]));
        }
    }
}

fn add_image(doc: &mut Document, image: &RasterImage) -> ObjectId {
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.rgb.clone(),
    ))
}

pub fn encode(pages: &[Page], letterhead: &Letterhead, title: &str) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }

    let logo_id = add_image(&mut doc, &letterhead.logo);
    let footer_id = add_image(&mut doc, &letterhead.footer);
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => dictionary! {
            image_name(ImageSlot::Logo) => logo_id,
            image_name(ImageSlot::Footer) => footer_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::new();
        for op in &page.ops {
            draw_operations(op, &mut operations);
        }
        let content = Content { operations }
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                pt(PAGE_WIDTH).into(),
                pt(PAGE_HEIGHT).into(),
            ],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("rps-calibration-server"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buffer)
}
