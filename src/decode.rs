/// QR decoding pipeline for captured tab images

use crate::error::ScanError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Decode the first readable QR symbol from a base64 image data URL, the
/// form `tabs.captureVisibleTab` hands back.
pub fn decode_data_url(data_url: &str) -> Result<Option<String>, ScanError> {
    let payload = data_url
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| ScanError::Decode("captured image is not a base64 data URL".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|err| ScanError::Decode(format!("bad base64 image payload: {err}")))?;

    decode_image(&bytes)
}

/// Decode from encoded image bytes (PNG as captured).
pub fn decode_image(bytes: &[u8]) -> Result<Option<String>, ScanError> {
    let image = image::load_from_memory(bytes)
        .map_err(|err| ScanError::Decode(format!("unreadable captured image: {err}")))?;

    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    decode_luma(luma.as_raw(), width as usize, height as usize)
}

/// Decode from a raw grayscale buffer. `Ok(None)` means no readable
/// symbol; the decoder itself is a black box.
pub fn decode_luma(pixels: &[u8], width: usize, height: usize) -> Result<Option<String>, ScanError> {
    if pixels.len() != width * height {
        return Err(ScanError::Decode(format!(
            "pixel buffer of {} bytes does not match {width}x{height}",
            pixels.len()
        )));
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| pixels[y * width + x]);

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) => return Ok(Some(content)),
            // A finder pattern without a readable symbol counts as not found.
            Err(err) => log::warn!("QR grid detected but not decodable: {err}"),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat};
    use std::io::Cursor;

    const SCALE: usize = 8;
    const QUIET_ZONE: usize = 4;

    /// Rasterize a QR symbol into a grayscale buffer with a quiet zone.
    fn render_qr(payload: &str) -> (Vec<u8>, usize) {
        let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let side = (modules + QUIET_ZONE * 2) * SCALE;
        let mut pixels = vec![255u8; side * side];

        for y in 0..modules {
            for x in 0..modules {
                if colors[y * modules + x] == qrcode::Color::Dark {
                    for dy in 0..SCALE {
                        for dx in 0..SCALE {
                            let px = (QUIET_ZONE + x) * SCALE + dx;
                            let py = (QUIET_ZONE + y) * SCALE + dy;
                            pixels[py * side + px] = 0;
                        }
                    }
                }
            }
        }

        (pixels, side)
    }

    fn as_png(pixels: Vec<u8>, side: usize) -> Vec<u8> {
        let gray = GrayImage::from_raw(side as u32, side as u32, pixels).unwrap();
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_luma_finds_payload() {
        let (pixels, side) = render_qr("https://example.com/decoded");

        let decoded = decode_luma(&pixels, side, side).unwrap();

        assert_eq!(decoded.as_deref(), Some("https://example.com/decoded"));
    }

    #[test]
    fn test_decode_luma_blank_image_is_not_found() {
        let pixels = vec![255u8; 64 * 64];

        let decoded = decode_luma(&pixels, 64, 64).unwrap();

        assert!(decoded.is_none());
    }

    #[test]
    fn test_decode_luma_rejects_mismatched_buffer() {
        let result = decode_luma(&[0u8; 10], 64, 64);

        assert!(matches!(result, Err(ScanError::Decode(_))));
    }

    #[test]
    fn test_decode_image_round_trip() {
        let (pixels, side) = render_qr("WIFI:T:WPA;S:lab;P:hunter2;;");
        let png = as_png(pixels, side);

        let decoded = decode_image(&png).unwrap();

        assert_eq!(decoded.as_deref(), Some("WIFI:T:WPA;S:lab;P:hunter2;;"));
    }

    #[test]
    fn test_decode_image_rejects_garbage_bytes() {
        let result = decode_image(b"definitely not a png");

        assert!(matches!(result, Err(ScanError::Decode(_))));
    }

    #[test]
    fn test_decode_data_url_round_trip() {
        let (pixels, side) = render_qr("hello");
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(as_png(pixels, side)));

        let decoded = decode_data_url(&data_url).unwrap();

        assert_eq!(decoded.as_deref(), Some("hello"));
    }

    #[test]
    fn test_decode_data_url_rejects_missing_prefix() {
        let result = decode_data_url("nonsense without a marker");

        assert!(matches!(result, Err(ScanError::Decode(_))));
    }

    #[test]
    fn test_decode_data_url_rejects_bad_base64() {
        let result = decode_data_url("data:image/png;base64,!!!not-base64!!!");

        assert!(matches!(result, Err(ScanError::Decode(_))));
    }
}
