//! On-disk storage for uploaded project images.
//!
//! Files live under `<media_root>/project_images/` and are referenced from
//! the database by their path relative to the media root. The same root is
//! served read-only under [`MEDIA_URL_PREFIX`].

use std::path::PathBuf;

use planner_core::reconcile::ImageUpload;
use uuid::Uuid;

/// URL prefix the media root is served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Subdirectory of the media root holding project images.
pub const IMAGE_DIR: &str = "project_images";

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write an upload to disk and return its path relative to the root.
    ///
    /// Stored names are `<uuid>_<sanitized client name>` so two uploads with
    /// the same name never collide.
    pub async fn save_image(&self, upload: &ImageUpload) -> std::io::Result<String> {
        let dir = self.root.join(IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let stored_name = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(&upload.file_name)
        );
        tokio::fs::write(dir.join(&stored_name), &upload.bytes).await?;

        tracing::debug!(
            file = %stored_name,
            bytes = upload.bytes.len(),
            "Stored uploaded image"
        );
        Ok(format!("{IMAGE_DIR}/{stored_name}"))
    }

    /// Absolute location of a stored file.
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Public URL of a stored file.
    pub fn url_of(&self, relative: &str) -> String {
        format!("{MEDIA_URL_PREFIX}/{relative}")
    }
}

/// Reduce a client-supplied file name to a safe single path segment.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
