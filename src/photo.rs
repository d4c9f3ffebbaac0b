use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::model::EmbeddedImage;

/// Displayed photo width: 1.5 inches.
pub const PHOTO_WIDTH: f32 = 108.0;

/// Load the header photo. A missing or unreadable file means "no photo".
pub fn load(path: &Path) -> Option<EmbeddedImage> {
    if !path.is_file() {
        log::info!("no photo at {}, header will have no picture", path.display());
        return None;
    }
    let img = match decode(path) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("ignoring photo {}: {e}", path.display());
            return None;
        }
    };
    match embed(img) {
        Ok(embedded) => Some(embedded),
        Err(e) => {
            log::warn!("ignoring photo {}: {e}", path.display());
            None
        }
    }
}

/// Decode by content, whatever the file extension says.
fn decode(path: &Path) -> Result<DynamicImage, image::ImageError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Normalise to RGBA PNG and size it to the photo column.
pub fn embed(img: DynamicImage) -> Result<EmbeddedImage, image::ImageError> {
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let (pixel_width, pixel_height) = (rgba.width(), rgba.height());

    let mut data = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;

    let display_height = if pixel_width == 0 {
        PHOTO_WIDTH
    } else {
        PHOTO_WIDTH * pixel_height as f32 / pixel_width as f32
    };
    log::debug!("photo {pixel_width}x{pixel_height}px, {} bytes as PNG", data.len());

    Ok(EmbeddedImage {
        data,
        pixel_width,
        pixel_height,
        display_width: PHOTO_WIDTH,
        display_height,
    })
}
