//! Display-time brightness filter.
//!
//! The generative renders come out noticeably brighter than the simulated
//! frames, which would give the comparison away on exposure alone. Every
//! generative image is therefore served darkened by a fixed factor; the
//! simulated side passes through untouched. Stored files are never modified.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::SurveyError;
use crate::pairs::Method;

/// Brightness multiplier for the generative-AI side of every pair.
/// 1.0 leaves the image as-is; lower values darken it.
pub const DARKEN_FACTOR: f32 = 0.6;

/// Scale the RGB channels of every pixel by `factor`, leaving alpha alone.
/// The factor is clamped to [0.0, 1.0].
pub fn darken(img: &DynamicImage, factor: f32) -> DynamicImage {
    let factor = factor.clamp(0.0, 1.0);
    let mut rgba: RgbaImage = img.to_rgba8();
    for px in rgba.pixels_mut() {
        for channel in px.0.iter_mut().take(3) {
            *channel = (f32::from(*channel) * factor).round() as u8;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Load an image from disk and return PNG bytes ready to serve, darkening
/// it first when it came from the generative pipeline.
pub fn load_for_display(path: &Path, method: Method) -> Result<Vec<u8>, SurveyError> {
    let img = image::open(path).map_err(|source| SurveyError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let img = match method {
        Method::GenerativeAi => darken(&img, DARKEN_FACTOR),
        Method::Simulated => img,
    };
    encode_png(&img)
}

/// Raw file bytes for an intro example image. No filtering is applied.
pub fn load_raw(path: &Path) -> Result<Vec<u8>, SurveyError> {
    if !path.exists() {
        return Err(SurveyError::MissingImage(path.to_path_buf()));
    }
    Ok(std::fs::read(path)?)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, SurveyError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(SurveyError::ImageEncode)?;
    Ok(buf.into_inner())
}
