//! Serialization of laid-out pages into PDF bytes.
//!
//! Text uses the standard Helvetica / Helvetica-Bold Type1 fonts with
//! WinAnsiEncoding, so no font program is embedded. Images are written as
//! Flate-compressed DeviceRGB XObjects, one per drawn image.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use super::layout::{DrawOp, Font, PageLayout, PAGE_HEIGHT, PAGE_WIDTH};
use super::text::encode_win_ansi;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

/// Hands out sequential indirect object ids.
struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        let id = Ref::new(self.0);
        self.0 += 1;
        id
    }
}

/// Zlib-compress `data`; `None` if the encoder fails.
fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).ok()?;
    encoder.finish().ok()
}

fn font_name(font: Font) -> Name<'static> {
    match font {
        Font::Regular => REGULAR_FONT,
        Font::Bold => BOLD_FONT,
    }
}

/// Write `pages` as a complete PDF document.
pub fn write_pdf(pages: &[PageLayout]) -> Vec<u8> {
    let mut alloc = RefAlloc(1);
    let catalog_id = alloc.next();
    let tree_id = alloc.next();
    let regular_id = alloc.next();
    let bold_id = alloc.next();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let mut page_ids = Vec::with_capacity(pages.len());

    for layout in pages {
        let page_id = alloc.next();
        let content_id = alloc.next();
        let mut content = Content::new();
        let mut x_objects: Vec<(String, Ref)> = Vec::new();

        for op in &layout.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    font,
                    size,
                    text,
                } => {
                    content.begin_text();
                    content.set_font(font_name(*font), *size);
                    content.next_line(*x, *y);
                    content.show(Str(&encode_win_ansi(text)));
                    content.end_text();
                }
                DrawOp::Rule { x1, x2, y } => {
                    content.set_line_width(1.0);
                    content.move_to(*x1, *y);
                    content.line_to(*x2, *y);
                    content.stroke();
                }
                DrawOp::Image {
                    x,
                    y,
                    width,
                    height,
                    raster,
                } => {
                    let image_id = alloc.next();
                    {
                        let compressed = deflate(&raster.rgb);
                        let data = compressed.as_deref().unwrap_or(raster.rgb.as_slice());
                        let mut image = pdf.image_xobject(image_id, data);
                        if compressed.is_some() {
                            image.filter(Filter::FlateDecode);
                        }
                        image.width(raster.width as i32);
                        image.height(raster.height as i32);
                        image.color_space().device_rgb();
                        image.bits_per_component(8);
                    }

                    let name = format!("Im{}", x_objects.len());
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                    x_objects.push((name, image_id));
                }
            }
        }

        pdf.stream(content_id, &content.finish());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(content_id);
        {
            let mut resources = page.resources();
            resources
                .fonts()
                .pair(REGULAR_FONT, regular_id)
                .pair(BOLD_FONT, bold_id);
            if !x_objects.is_empty() {
                let mut dict = resources.x_objects();
                for (name, id) in &x_objects {
                    dict.pair(Name(name.as_bytes()), *id);
                }
            }
        }
        page.finish();

        page_ids.push(page_id);
    }

    let count = page_ids.len() as i32;
    pdf.pages(tree_id).kids(page_ids).count(count);

    pdf.finish()
}
