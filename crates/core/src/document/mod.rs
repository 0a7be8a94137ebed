//! Paginated PDF export of a project.
//!
//! Rendering happens in two steps: [`layout::lay_out`] places the header,
//! fields, wrapped description and images on pages, then
//! [`pdf::write_pdf`] serializes those pages. Image files are read and
//! decoded one at a time through an [`ImageLoader`]; a failure is drawn as
//! an inline error line instead of aborting the export.

pub mod layout;
pub mod pdf;
pub mod text;

use std::path::PathBuf;

use crate::project::{Priority, Status};
use crate::types::Date;

/// MIME type of the rendered document.
pub const CONTENT_TYPE: &str = "application/pdf";

/// The project fields and images that go into an export.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    pub start_date: Date,
    pub end_date: Date,
    /// Images in their stored order.
    pub images: Vec<DocumentImage>,
}

/// An image file to draw, with the name used for its caption.
#[derive(Debug, Clone)]
pub struct DocumentImage {
    pub file_name: String,
    pub path: PathBuf,
}

/// Decoded 8-bit RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Decode(#[from] image::ImageError),
}

/// Source of decoded image pixels for the renderer.
pub trait ImageLoader {
    fn load(&self, image: &DocumentImage) -> Result<RasterImage, ImageLoadError>;
}

/// Largest raster kept for an image; twice the 200x150 pt drawing box.
pub const MAX_RASTER_WIDTH: u32 = 400;
pub const MAX_RASTER_HEIGHT: u32 = 300;

/// Reads image files from disk and decodes them with the `image` crate.
///
/// Larger images are scaled down to fit [`MAX_RASTER_WIDTH`] x
/// [`MAX_RASTER_HEIGHT`], keeping their aspect ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, image: &DocumentImage) -> Result<RasterImage, ImageLoadError> {
        let bytes = std::fs::read(&image.path)?;
        let mut decoded = image::load_from_memory(&bytes)?;
        if decoded.width() > MAX_RASTER_WIDTH || decoded.height() > MAX_RASTER_HEIGHT {
            decoded = decoded.thumbnail(MAX_RASTER_WIDTH, MAX_RASTER_HEIGHT);
        }
        let decoded = decoded.to_rgb8();
        Ok(RasterImage {
            width: decoded.width(),
            height: decoded.height(),
            rgb: decoded.into_raw(),
        })
    }
}

/// Render `document` to PDF bytes.
///
/// Always returns a complete document, even when some images fail to load.
pub fn render(document: &ProjectDocument, loader: &dyn ImageLoader) -> Vec<u8> {
    let pages = layout::lay_out(document, loader);
    tracing::debug!(
        pages = pages.len(),
        images = document.images.len(),
        "Rendered project document"
    );
    pdf::write_pdf(&pages)
}

/// Suggested download name for a project's export.
pub fn export_file_name(project_id: crate::types::DbId) -> String {
    format!("project_{project_id}.pdf")
}
