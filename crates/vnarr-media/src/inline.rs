//! Inline (base64) image payloads from capture sources.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use rayon::prelude::*;

use crate::error::{MediaError, MediaResult};

/// Strip an optional `data:<mime>;base64,` prefix.
fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    }
}

/// Decode one base64 payload into an image.
pub fn decode_inline_image(index: usize, payload: &str) -> MediaResult<DynamicImage> {
    let data = strip_data_url(payload.trim());
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| MediaError::invalid_image_data(index, format!("bad base64: {}", e)))?;

    image::load_from_memory(&bytes)
        .map_err(|e| MediaError::invalid_image_data(index, format!("undecodable image: {}", e)))
}

/// Decode every payload, preserving order. Any bad member fails the whole set.
pub fn decode_inline_images(payloads: &[String]) -> MediaResult<Vec<DynamicImage>> {
    payloads
        .par_iter()
        .enumerate()
        .map(|(index, payload)| decode_inline_image(index, payload))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn png_base64(width: u32) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 2, image::Rgb([9, 9, 9])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decodes_plain_and_data_url_payloads() {
        let payloads = vec![
            png_base64(3),
            format!("data:image/png;base64,{}", png_base64(4)),
        ];
        let images = decode_inline_images(&payloads).unwrap();
        assert_eq!(images[0].width(), 3);
        assert_eq!(images[1].width(), 4);
    }

    #[test]
    fn test_bad_member_reports_its_position() {
        let payloads = vec![png_base64(3), "!!not-base64!!".to_string()];
        let err = decode_inline_images(&payloads).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImageData { index: 1, .. }));
    }

    #[test]
    fn test_valid_base64_of_non_image() {
        let payload = STANDARD.encode(b"hello world");
        let err = decode_inline_image(0, &payload).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImageData { index: 0, .. }));
    }
}
