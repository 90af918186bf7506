use std::path::Path;

use image::DynamicImage;

use crate::error::{AppError, Result};

/// Read and decode an image file. Both unreadable files and undecodable bytes
/// are reported as decode failures.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Decode(format!("{}: {}", path.display(), e)))?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image)
}

/// Centre-crop to a 1:1 aspect ratio, then shrink so neither side exceeds
/// `max_side`. Images already within bounds are never upscaled.
pub fn crop_square(image: &DynamicImage, max_side: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    let square = image.crop_imm(x, y, side, side);

    if max_side > 0 && side > max_side {
        square.resize_exact(max_side, max_side, image::imageops::FilterType::Triangle)
    } else {
        square
    }
}
