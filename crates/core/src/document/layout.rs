//! Page layout for the project export.
//!
//! Positions are PDF points with the origin at the bottom-left of a US
//! Letter page. A single cursor `y` moves down the page; whenever a block
//! does not fit, a new page is started with the header redrawn and the
//! cursor reset to [`TOP_MARGIN`].

use super::text::{pdf_safe, wrap_text};
use super::{DocumentImage, ImageLoader, ProjectDocument, RasterImage};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const HEADER_Y: f32 = 770.0;
const HEADER_FONT_SIZE: f32 = 14.0;
const RULE_GAP: f32 = 5.0;
const RULE_END_X: f32 = 530.0;

/// Cursor position at the top of every page.
pub const TOP_MARGIN: f32 = 750.0;
/// Lowest baseline the description may use.
pub const BOTTOM_MARGIN: f32 = 50.0;

const FIRST_FIELD_DROP: f32 = 40.0;
const LABEL_X: f32 = 80.0;
const VALUE_X: f32 = 180.0;
const FIELD_FONT_SIZE: f32 = 12.0;
const FIELD_STEP: f32 = 20.0;
const SECTION_GAP: f32 = 40.0;

const DESCRIPTION_LABEL_STEP: f32 = 15.0;
const DESCRIPTION_X: f32 = 90.0;
pub const DESCRIPTION_WIDTH: f32 = 400.0;
pub const DESCRIPTION_FONT_SIZE: f32 = 10.0;
pub const DESCRIPTION_LEADING: f32 = 12.0;

/// An image block needs at least this much room above the page bottom.
const IMAGE_MIN_Y: f32 = 200.0;
const IMAGE_WIDTH: f32 = 200.0;
const IMAGE_HEIGHT: f32 = 150.0;
const CAPTION_OFFSET: f32 = 170.0;
const CAPTION_FONT_SIZE: f32 = 10.0;
const IMAGE_BLOCK: f32 = 200.0;

const ERROR_MIN_Y: f32 = 50.0;
const ERROR_FONT_SIZE: f32 = 10.0;
const ERROR_LINE: f32 = 20.0;

/// Prefix of the line drawn in place of an image that failed to load.
pub const IMAGE_ERROR_PREFIX: &str = "Error loading image: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// A single drawing instruction on a page.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        raster: RasterImage,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    /// All text drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of images drawn on the page.
    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

struct Cursor {
    header: String,
    pages: Vec<PageLayout>,
    page: PageLayout,
    y: f32,
}

impl Cursor {
    fn new(title: &str) -> Self {
        let mut cursor = Self {
            header: pdf_safe(&format!("Project Report: {title}")),
            pages: Vec::new(),
            page: PageLayout::default(),
            y: TOP_MARGIN,
        };
        cursor.draw_header();
        cursor
    }

    fn draw_header(&mut self) {
        self.page.ops.push(DrawOp::Text {
            x: LABEL_X,
            y: HEADER_Y,
            font: Font::Bold,
            size: HEADER_FONT_SIZE,
            text: self.header.clone(),
        });
        self.page.ops.push(DrawOp::Rule {
            x1: LABEL_X,
            x2: RULE_END_X,
            y: HEADER_Y - RULE_GAP,
        });
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.page));
        self.draw_header();
        self.y = TOP_MARGIN;
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        self.page.ops.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            text: pdf_safe(text),
        });
    }

    fn field(&mut self, label: &str, value: &str, step: f32) {
        if self.y < BOTTOM_MARGIN {
            self.new_page();
        }
        self.text(LABEL_X, self.y, Font::Bold, FIELD_FONT_SIZE, label);
        self.text(VALUE_X, self.y, Font::Regular, FIELD_FONT_SIZE, value);
        self.y -= step;
    }

    fn description(&mut self, description: &str) {
        self.text(LABEL_X, self.y, Font::Bold, FIELD_FONT_SIZE, "Description:");
        self.y -= DESCRIPTION_LABEL_STEP;

        let lines = wrap_text(&pdf_safe(description), DESCRIPTION_FONT_SIZE, DESCRIPTION_WIDTH);
        let height = lines.len() as f32 * DESCRIPTION_LEADING;
        if height > self.y - BOTTOM_MARGIN {
            self.new_page();
        }

        for line in &lines {
            if self.y - DESCRIPTION_LEADING < BOTTOM_MARGIN {
                self.new_page();
            }
            self.y -= DESCRIPTION_LEADING;
            self.text(DESCRIPTION_X, self.y, Font::Regular, DESCRIPTION_FONT_SIZE, line);
        }
        self.y -= FIELD_STEP;
    }

    fn image(&mut self, image: &DocumentImage, loader: &dyn ImageLoader) {
        if self.y < IMAGE_MIN_Y {
            self.new_page();
        }

        match loader.load(image) {
            Ok(raster) => {
                self.page.ops.push(DrawOp::Image {
                    x: LABEL_X,
                    y: self.y - IMAGE_HEIGHT,
                    width: IMAGE_WIDTH,
                    height: IMAGE_HEIGHT,
                    raster,
                });
                self.text(
                    LABEL_X,
                    self.y - CAPTION_OFFSET,
                    Font::Bold,
                    CAPTION_FONT_SIZE,
                    &image.file_name,
                );
                self.y -= IMAGE_BLOCK;
            }
            Err(err) => {
                tracing::warn!(file = %image.file_name, error = %err, "Image could not be drawn");
                if self.y < ERROR_MIN_Y {
                    self.new_page();
                }
                let line = format!("{IMAGE_ERROR_PREFIX}{err}");
                self.text(LABEL_X, self.y, Font::Regular, ERROR_FONT_SIZE, &line);
                self.y -= ERROR_LINE;
            }
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.pages.push(self.page);
        self.pages
    }
}

/// Lay out `document` across as many pages as its content needs.
///
/// Images are loaded one at a time through `loader`; a failed load is
/// reported inline and the remaining images are still drawn.
pub fn lay_out(document: &ProjectDocument, loader: &dyn ImageLoader) -> Vec<PageLayout> {
    let mut cursor = Cursor::new(&document.title);
    cursor.y -= FIRST_FIELD_DROP;

    cursor.field("Project Title:", &document.title, FIELD_STEP);
    cursor.description(&document.description);
    cursor.field("Priority:", document.priority.as_str(), FIELD_STEP);
    cursor.field("Status:", document.status.as_str(), FIELD_STEP);
    cursor.field("Category:", &document.category, FIELD_STEP);
    cursor.field("Start Date:", &document.start_date.to_string(), FIELD_STEP);
    cursor.field("End Date:", &document.end_date.to_string(), SECTION_GAP);

    for image in &document.images {
        cursor.image(image, loader);
    }

    cursor.finish()
}
