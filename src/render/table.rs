//! Bordered tables whose rows never split across pages.

use super::page::{Align, Frame, Layout, TextStyle};
use super::text::wrap_text;

const CELL_PADDING: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub width: f32,
    pub align: Align,
}

#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub header_height: f32,
    pub header_text: TextStyle,
    pub header_border: f32,
    pub body_text: TextStyle,
    pub body_border: f32,
    pub line_height: f32,
    /// Extra height added to every body row.
    pub row_padding: f32,
}

struct WrappedRow {
    cells: Vec<Vec<String>>,
    height: f32,
}

fn wrap_row(columns: &[Column], row: &[String], style: &TableStyle) -> WrappedRow {
    let cells: Vec<Vec<String>> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let text = row.get(i).map(String::as_str).unwrap_or("");
            wrap_text(
                text,
                style.body_text.face,
                style.body_text.size,
                column.width - 2.0 * CELL_PADDING,
            )
        })
        .collect();
    let max_lines = cells.iter().map(Vec::len).max().unwrap_or(1);
    WrappedRow {
        height: max_lines as f32 * style.line_height + style.row_padding,
        cells,
    }
}

fn anchor(x: f32, column: &Column) -> f32 {
    match column.align {
        Align::Left => x + CELL_PADDING,
        Align::Center => x + column.width / 2.0,
        Align::Right => x + column.width - CELL_PADDING,
    }
}

fn draw_header(layout: &mut Layout, columns: &[Column], style: &TableStyle) {
    let top = layout.y();
    let baseline = top + (style.header_height + style.header_text.cap_height()) / 2.0;
    let mut x = layout.geometry().left_margin;
    for column in columns {
        layout.rect(
            Frame {
                x,
                y: top,
                width: column.width,
                height: style.header_height,
            },
            style.header_border,
        );
        layout.text_aligned(anchor(x, column), baseline, column.header, style.header_text, column.align);
        x += column.width;
    }
    layout.advance(style.header_height);
}

fn draw_row(layout: &mut Layout, columns: &[Column], row: &WrappedRow, style: &TableStyle) {
    let top = layout.y();
    let mut x = layout.geometry().left_margin;
    for (column, lines) in columns.iter().zip(&row.cells) {
        layout.rect(
            Frame {
                x,
                y: top,
                width: column.width,
                height: row.height,
            },
            style.body_border,
        );
        let block = lines.len() as f32 * style.line_height;
        let first_baseline = top
            + (row.height - block) / 2.0
            + (style.line_height + style.body_text.cap_height()) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            layout.text_aligned(
                anchor(x, column),
                first_baseline + i as f32 * style.line_height,
                line,
                style.body_text,
                column.align,
            );
        }
        x += column.width;
    }
    layout.advance(row.height);
}

/// Draw the header and body rows. A row that does not fit moves whole to a
/// new page, where the header is drawn again first.
pub fn draw_table(layout: &mut Layout, columns: &[Column], rows: &[Vec<String>], style: &TableStyle) {
    let wrapped: Vec<WrappedRow> = rows.iter().map(|row| wrap_row(columns, row, style)).collect();

    let first_height = wrapped.first().map(|row| row.height).unwrap_or(0.0);
    layout.ensure_space(style.header_height + first_height);
    draw_header(layout, columns, style);

    for row in &wrapped {
        if !layout.fits(row.height) {
            if row.height + style.header_height > layout.page_capacity() {
                log::warn!("Table row of {:.1} mm is taller than a page", row.height);
            }
            layout.new_page();
            draw_header(layout, columns, style);
        }
        draw_row(layout, columns, row, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::page::{DrawOp, PageGeometry};
    use crate::render::text::FontFace;

    const GEOMETRY: PageGeometry = PageGeometry {
        left_margin: 15.0,
        content_width: 180.0,
        content_top: 40.0,
        content_bottom: 120.0,
        logo: Frame {
            x: 2.0,
            y: 10.0,
            width: 60.0,
            height: 20.0,
        },
    };

    const STYLE: TableStyle = TableStyle {
        header_height: 8.0,
        header_text: TextStyle::new(FontFace::Bold, 10.0),
        header_border: 0.5,
        body_text: TextStyle::new(FontFace::Regular, 10.0),
        body_border: 0.2,
        line_height: 6.0,
        row_padding: 2.0,
    };

    const COLUMNS: [Column; 2] = [
        Column {
            header: "Sr. No.",
            width: 20.0,
            align: Align::Center,
        },
        Column {
            header: "Item",
            width: 160.0,
            align: Align::Left,
        },
    ];

    #[test]
    fn overflowing_row_moves_whole_with_repeated_header() {
        let mut layout = Layout::new(GEOMETRY);
        layout.advance(50.0);
        let rows: Vec<Vec<String>> = (1..=4)
            .map(|i| vec![i.to_string(), format!("row {i}")])
            .collect();
        draw_table(&mut layout, &COLUMNS, &rows, &STYLE);

        let pages = layout.into_pages();
        assert_eq!(pages.len(), 2);
        // Header plus rows 1-2 on page one, header plus rows 3-4 on page two.
        assert_eq!(pages[0].texts(), vec!["Sr. No.", "Item", "1", "row 1", "2", "row 2"]);
        assert_eq!(pages[1].texts(), vec!["Sr. No.", "Item", "3", "row 3", "4", "row 4"]);
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Rect { frame, .. } = op {
                    assert!(frame.y + frame.height <= GEOMETRY.content_bottom + 1e-3);
                }
            }
        }
    }

    #[test]
    fn multi_line_cells_grow_the_row() {
        let columns = [Column {
            header: "Text",
            width: 30.0,
            align: Align::Left,
        }];
        let row = vec!["a fairly long description that wraps".to_string()];
        let wrapped = wrap_row(&columns, &row, &STYLE);
        assert!(wrapped.cells[0].len() > 1);
        assert_eq!(
            wrapped.height,
            wrapped.cells[0].len() as f32 * STYLE.line_height + STYLE.row_padding
        );
    }

    #[test]
    fn header_is_not_orphaned() {
        let mut layout = Layout::new(GEOMETRY);
        layout.advance(70.0);
        let rows = vec![vec!["1".to_string(), "only row".to_string()]];
        draw_table(&mut layout, &COLUMNS, &rows, &STYLE);
        let pages = layout.into_pages();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].texts().is_empty());
        assert_eq!(pages[1].texts(), vec!["Sr. No.", "Item", "1", "only row"]);
    }
}
