//! PNG export of the graph canvas from a captured viewport frame.

use std::path::{Path, PathBuf};

use eframe::egui::{ColorImage, Rect};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

pub const DEFAULT_EXPORT_FILE: &str = "disease-network.png";
/// Exported images are at least this many pixels per logical point.
pub const EXPORT_SCALE: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("the canvas is not inside the captured frame")]
    EmptyRegion,
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Cuts the canvas area out of a full-window capture and upscales it to
/// [`EXPORT_SCALE`] when the display density is lower.
pub fn canvas_image(
    frame: &ColorImage,
    canvas: Rect,
    pixels_per_point: f32,
) -> Result<RgbaImage, ExportError> {
    let [frame_width, frame_height] = frame.size;
    let to_pixel = |value: f32, limit: usize| {
        ((value * pixels_per_point).round().max(0.0) as usize).min(limit)
    };
    let left = to_pixel(canvas.left(), frame_width);
    let right = to_pixel(canvas.right(), frame_width);
    let top = to_pixel(canvas.top(), frame_height);
    let bottom = to_pixel(canvas.bottom(), frame_height);
    if right <= left || bottom <= top {
        return Err(ExportError::EmptyRegion);
    }

    let width = u32::try_from(right - left).map_err(|_| ExportError::EmptyRegion)?;
    let height = u32::try_from(bottom - top).map_err(|_| ExportError::EmptyRegion)?;
    let cropped = RgbaImage::from_fn(width, height, |x, y| {
        let index = (top + y as usize) * frame_width + left + x as usize;
        Rgba(frame.pixels[index].to_srgba_unmultiplied())
    });

    let target_width = (canvas.width() * EXPORT_SCALE).round() as u32;
    let target_height = (canvas.height() * EXPORT_SCALE).round() as u32;
    if target_width > width && target_height > height {
        Ok(imageops::resize(
            &cropped,
            target_width,
            target_height,
            FilterType::Triangle,
        ))
    } else {
        Ok(cropped)
    }
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}
