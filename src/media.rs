//! Local media helpers: loading images into request parts and saving decoded images.

use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{GeminiError, Result};
use crate::output::OutputDir;
use crate::types::{Blob, Part};

/// An image read from disk, ready to be sent inline.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalImage {
    pub path: PathBuf,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    /// Read an image file. The mime type is sniffed from the bytes, then guessed from
    /// the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GeminiError::InvalidInput(format!(
                "Image not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)?;
        let mime_type = guess_mime(&bytes, path);
        if !mime_type.starts_with("image/") {
            return Err(GeminiError::InvalidInput(format!(
                "{} is not an image ({mime_type})",
                path.display()
            )));
        }
        debug!(path = %path.display(), mime_type = %mime_type, bytes = bytes.len(), "Loaded image");
        Ok(Self {
            path: path.to_path_buf(),
            mime_type,
            bytes,
        })
    }

    pub fn to_part(&self) -> Part {
        Part::inline(self.mime_type.clone(), &self.bytes)
    }

    pub fn to_blob(&self) -> Blob {
        Blob::from_bytes(self.mime_type.clone(), &self.bytes)
    }
}

/// Mime type from magic bytes, falling back to the file extension.
pub fn guess_mime(bytes: &[u8], path: &Path) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

/// Decode inline image data.
pub fn decode_image(blob: &Blob) -> Result<DynamicImage> {
    let bytes = blob.decode()?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Save an image as `{prefix}{n}.jpg` in the output directory.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn save_jpeg(output: &OutputDir, prefix: &str, image: &DynamicImage) -> Result<PathBuf> {
    let path = output.next_path(prefix, "jpg")?;
    image
        .to_rgb8()
        .save_with_format(&path, ImageFormat::Jpeg)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "Saved image");
    Ok(path)
}
