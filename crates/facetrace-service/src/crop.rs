//! Face crop persistence.
//!
//! Crops are addressable by a deterministic key derived from the source
//! image id and the detection index, so the query layer can existence-check
//! them without a database round trip.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;
use uuid::Uuid;

use facetrace_core::BoundingBox;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("bounding box {0}x{1} lies outside the image")]
    OutOfBounds(f32, f32),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Deterministic crop location for `(image_id, detection_index)`.
pub fn crop_path(crop_dir: &Path, image_id: Uuid, index: usize) -> PathBuf {
    crop_dir.join(format!("face_{image_id}_{index}.jpg"))
}

/// Cut the bounding box out of the decoded source image and write it as
/// JPEG. The box is clamped to the image bounds first.
pub fn write_crop(
    source: &DynamicImage,
    bbox: &BoundingBox,
    dest: &Path,
) -> Result<(), CropError> {
    let (img_w, img_h) = (source.width(), source.height());

    let x = bbox.x.max(0.0) as u32;
    let y = bbox.y.max(0.0) as u32;
    if x >= img_w || y >= img_h {
        return Err(CropError::OutOfBounds(bbox.x, bbox.y));
    }
    let width = (bbox.width as u32).min(img_w - x);
    let height = (bbox.height as u32).min(img_h - y);
    if width == 0 || height == 0 {
        return Err(CropError::OutOfBounds(bbox.width, bbox.height));
    }

    let crop = source.crop_imm(x, y, width, height);
    crop.to_rgb8().save(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_crop_path_is_deterministic() {
        let id = Uuid::new_v4();
        let dir = Path::new("/data/faces");
        assert_eq!(crop_path(dir, id, 0), crop_path(dir, id, 0));
        assert_ne!(crop_path(dir, id, 0), crop_path(dir, id, 1));
        assert_eq!(
            crop_path(dir, id, 2),
            dir.join(format!("face_{id}_2.jpg"))
        );
    }

    #[test]
    fn test_write_crop_clamps_to_bounds() {
        let source = DynamicImage::ImageRgb8(image::RgbImage::new(32, 32));
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("crop.jpg");

        write_crop(&source, &bbox(16.0, 16.0, 100.0, 100.0), &dest).unwrap();
        let written = image::open(&dest).unwrap();
        assert_eq!((written.width(), written.height()), (16, 16));
    }

    #[test]
    fn test_write_crop_rejects_box_outside_image() {
        let source = DynamicImage::ImageRgb8(image::RgbImage::new(32, 32));
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("crop.jpg");

        let err = write_crop(&source, &bbox(40.0, 0.0, 8.0, 8.0), &dest);
        assert!(matches!(err, Err(CropError::OutOfBounds(..))));
        assert!(!dest.exists());
    }
}
