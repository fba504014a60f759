//! Page model and the top-down layout cursor.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page. Text
//! `y` values are baselines, shape `y` values are top edges.

use super::text::{wrap_text, FontFace, MM_PER_PT};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub const fn gray(level: u8) -> Self {
        Rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32) -> Self {
        Self {
            face,
            size,
            color: Rgb::BLACK,
        }
    }

    pub const fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Cap height in millimetres, used to centre text vertically.
    pub fn cap_height(&self) -> f32 {
        self.size * MM_PER_PT * 0.66
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Rect {
        frame: Frame,
        line_width: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        line_width: f32,
        color: Rgb,
    },
    Image {
        slot: ImageSlot,
        frame: Frame,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text runs in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self, slot: ImageSlot) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { slot: s, .. } if *s == slot))
            .count()
    }
}

/// Fixed margins of one document kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub left_margin: f32,
    pub content_width: f32,
    /// Cursor position on a fresh page, below the logo.
    pub content_top: f32,
    /// Nothing may extend below this line.
    pub content_bottom: f32,
    pub logo: Frame,
}

impl PageGeometry {
    pub fn right_edge(&self) -> f32 {
        self.left_margin + self.content_width
    }
}

/// `label: value` rows with a wrapped value column.
#[derive(Debug, Clone, Copy)]
pub struct FieldStyle {
    pub label_x: f32,
    pub value_x: f32,
    pub value_width: f32,
    pub label: TextStyle,
    pub value: TextStyle,
    pub line_height: f32,
    pub label_suffix: &'static str,
    pub value_prefix: &'static str,
}

pub struct Layout {
    geometry: PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut layout = Self {
            geometry,
            pages: Vec::new(),
            y: geometry.content_top,
        };
        layout.new_page();
        layout
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Open a fresh page with the logo and reset the cursor.
    pub fn new_page(&mut self) {
        self.pages.push(Page {
            ops: vec![DrawOp::Image {
                slot: ImageSlot::Logo,
                frame: self.geometry.logo,
            }],
        });
        self.y = self.geometry.content_top;
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.content_bottom
    }

    /// Break to a new page unless `height` fits below the cursor. Returns
    /// whether a break happened.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.fits(height) {
            return false;
        }
        self.new_page();
        true
    }

    /// Height available on an empty page.
    pub fn page_capacity(&self) -> f32 {
        self.geometry.content_bottom - self.geometry.content_top
    }

    pub fn draw(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, style: TextStyle) {
        self.draw(DrawOp::Text {
            x,
            y,
            text: text.into(),
            style,
        });
    }

    /// Place text relative to `anchor_x` (left edge, centre or right edge).
    pub fn text_aligned(&mut self, anchor_x: f32, y: f32, text: &str, style: TextStyle, align: Align) {
        let width = super::text::text_width(text, style.face, style.size);
        let x = match align {
            Align::Left => anchor_x,
            Align::Center => anchor_x - width / 2.0,
            Align::Right => anchor_x - width,
        };
        self.text(x, y, text, style);
    }

    pub fn rect(&mut self, frame: Frame, line_width: f32) {
        self.draw(DrawOp::Rect { frame, line_width });
    }

    pub fn rule(&mut self, x1: f32, x2: f32, y: f32, line_width: f32, color: Rgb) {
        self.draw(DrawOp::Line {
            from: (x1, y),
            to: (x2, y),
            line_width,
            color,
        });
    }

    /// One labelled field. The whole row moves to the next page when its
    /// wrapped value does not fit.
    pub fn field_row(&mut self, label: &str, value: &str, style: &FieldStyle) {
        let lines = wrap_text(
            &format!("{}{}", style.value_prefix, value),
            style.value.face,
            style.value.size,
            style.value_width,
        );
        let height = lines.len() as f32 * style.line_height;
        self.ensure_space(height);

        let y = self.y;
        self.text(style.label_x, y, format!("{}{}", label, style.label_suffix), style.label);
        for (i, line) in lines.into_iter().enumerate() {
            self.text(style.value_x, y + i as f32 * style.line_height, line, style.value);
        }
        self.y += height;
    }

    /// Wrapped text inside a full-width box. A box taller than the space left
    /// continues on following pages.
    pub fn boxed_paragraph(&mut self, text: &str, style: TextStyle, line_height: f32, padding: f32) {
        let left = self.geometry.left_margin;
        let width = self.geometry.content_width;
        let mut lines = wrap_text(text, style.face, style.size, width - padding).into_iter();
        let mut remaining = lines.len();

        let full_height = remaining as f32 * line_height + padding;
        if !self.fits(full_height) && full_height <= self.page_capacity() {
            self.new_page();
        }

        while remaining > 0 {
            let room = ((self.geometry.content_bottom - self.y - padding) / line_height)
                .floor()
                .max(0.0) as usize;
            if room == 0 && self.y > self.geometry.content_top {
                self.new_page();
                continue;
            }
            let take = room.clamp(1, remaining);

            let top = self.y;
            let height = take as f32 * line_height + padding;
            self.rect(Frame { x: left, y: top, width, height }, 0.2);
            for (i, line) in lines.by_ref().take(take).enumerate() {
                self.text(left + 2.0, top + padding + i as f32 * line_height, line, style);
            }
            remaining -= take;
            self.y = top + height;
            if remaining > 0 {
                self.new_page();
            }
        }
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

/// Stamp the footer image on every page.
pub fn stamp_footer(pages: &mut [Page], frame: Frame) {
    for page in pages.iter_mut() {
        page.ops.push(DrawOp::Image {
            slot: ImageSlot::Footer,
            frame,
        });
    }
}
