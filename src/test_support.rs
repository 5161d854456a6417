use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

/// A 2x2 semi-transparent red PNG.
pub(crate) fn png_bytes() -> Vec<u8> {
    let image = ImageBuffer::from_pixel(2, 2, Rgba([255u8, 0, 0, 128]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}
