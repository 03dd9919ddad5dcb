//! Collage rendering.
//!
//! Members are cover-fitted into equally sized cells on a white RGBA canvas
//! of [`GRID_COLUMNS`] x [`GRID_ROWS`] cells. Member `i` lands in column
//! `i % 3`, row `i / 3`.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::debug;

use vnarr_models::{grid_position, BATCH_SIZE, GRID_COLUMNS, GRID_ROWS};

use crate::error::{MediaError, MediaResult};

/// Default cell width in pixels.
pub const DEFAULT_CELL_WIDTH: u32 = 600;

/// Default cell height in pixels.
pub const DEFAULT_CELL_HEIGHT: u32 = 400;

/// Default JPEG quality for rendered collages.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Collage geometry and encoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollageLayout {
    pub cell_width: u32,
    pub cell_height: u32,
    pub jpeg_quality: u8,
}

impl Default for CollageLayout {
    fn default() -> Self {
        Self {
            cell_width: DEFAULT_CELL_WIDTH,
            cell_height: DEFAULT_CELL_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CollageLayout {
    /// Canvas size as `(width, height)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            self.cell_width * GRID_COLUMNS as u32,
            self.cell_height * GRID_ROWS as u32,
        )
    }
}

/// Render up to six images into one collage canvas.
///
/// Resizing runs in parallel; placement is decided by input position only.
pub fn render_collage(layout: &CollageLayout, images: Vec<DynamicImage>) -> MediaResult<RgbaImage> {
    if images.is_empty() || images.len() > BATCH_SIZE {
        return Err(MediaError::BatchSize {
            got: images.len(),
            max: BATCH_SIZE,
        });
    }

    let (width, height) = layout.canvas_size();
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    let cells: Vec<RgbaImage> = images
        .into_par_iter()
        .map(|img| {
            img.resize_to_fill(layout.cell_width, layout.cell_height, FilterType::Lanczos3)
                .to_rgba8()
        })
        .collect();

    for (idx, cell) in cells.iter().enumerate() {
        let (x, y) = grid_position(idx).offset(layout.cell_width, layout.cell_height);
        imageops::overlay(&mut canvas, cell, x as i64, y as i64);
    }

    debug!(members = cells.len(), width, height, "Rendered collage");
    Ok(canvas)
}

/// Encode a canvas as JPEG. The alpha channel is dropped.
pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> MediaResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut bytes = Vec::new();

    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;

    Ok(bytes)
}

/// Decode image files, preserving input order.
pub fn load_image_files(paths: &[PathBuf]) -> MediaResult<Vec<DynamicImage>> {
    paths.par_iter().map(|path| load_image_file(path)).collect()
}

fn load_image_file(path: &Path) -> MediaResult<DynamicImage> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    fn assert_px(canvas: &RgbaImage, x: u32, y: u32, expected: [u8; 4]) {
        let actual = canvas.get_pixel(x, y).0;
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(
                (*a as i16 - *e as i16).abs() <= 2,
                "pixel ({}, {}) was {:?}, expected {:?}",
                x,
                y,
                actual,
                expected
            );
        }
    }

    fn small_layout() -> CollageLayout {
        CollageLayout {
            cell_width: 60,
            cell_height: 40,
            jpeg_quality: 80,
        }
    }

    #[test]
    fn test_canvas_size() {
        assert_eq!(CollageLayout::default().canvas_size(), (1800, 800));
    }

    #[test]
    fn test_members_land_in_grid_order() {
        let layout = small_layout();
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 0]];
        let images = colors.iter().map(|c| solid(30, 20, *c)).collect();

        let canvas = render_collage(&layout, images).unwrap();
        assert_eq!(canvas.dimensions(), (180, 80));

        // centre of each occupied cell
        assert_px(&canvas, 30, 20, [255, 0, 0, 255]);
        assert_px(&canvas, 90, 20, [0, 255, 0, 255]);
        assert_px(&canvas, 150, 20, [0, 0, 255, 255]);
        assert_px(&canvas, 30, 60, [255, 255, 0, 255]);

        // cells 4 and 5 stay white
        assert_px(&canvas, 90, 60, [255, 255, 255, 255]);
        assert_px(&canvas, 150, 60, [255, 255, 255, 255]);
    }

    #[test]
    fn test_cover_fit_fills_whole_cell() {
        let layout = small_layout();
        // very wide source: cover must crop, not letterbox
        let canvas = render_collage(&layout, vec![solid(400, 20, [10, 20, 30])]).unwrap();
        assert_px(&canvas, 0, 0, [10, 20, 30, 255]);
        assert_px(&canvas, 59, 39, [10, 20, 30, 255]);
        assert_px(&canvas, 60, 0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rejects_bad_batch_sizes() {
        let layout = small_layout();
        assert!(matches!(
            render_collage(&layout, vec![]),
            Err(MediaError::BatchSize { got: 0, .. })
        ));
        let seven = (0..7).map(|_| solid(4, 4, [0, 0, 0])).collect();
        assert!(matches!(
            render_collage(&layout, seven),
            Err(MediaError::BatchSize { got: 7, .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_roundtrips_dimensions() {
        let layout = small_layout();
        let canvas = render_collage(&layout, vec![solid(10, 10, [200, 10, 10])]).unwrap();
        let bytes = encode_jpeg(&canvas, layout.jpeg_quality).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (180, 80));
    }

    #[test]
    fn test_load_image_files_keeps_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        solid(3, 3, [1, 2, 3]).save(&a).unwrap();
        solid(5, 5, [4, 5, 6]).save(&b).unwrap();

        let images = load_image_files(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(images[0].width(), 5);
        assert_eq!(images[1].width(), 3);

        let missing = load_image_files(&[dir.path().join("c.png")]).unwrap_err();
        assert!(matches!(missing, MediaError::FileNotFound(_)));
    }
}
