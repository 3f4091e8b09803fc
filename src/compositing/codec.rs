use crate::error::MattingError;
use image::RgbaImage;
use std::io::Cursor;

/// Decode encoded image bytes into an RGBA pixel buffer.
///
/// Fails with [`MattingError::Decode`] on corrupt data, an unsupported
/// format, or zero dimensions.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, MattingError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| MattingError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(MattingError::Decode("image has zero dimensions".into()));
    }
    Ok(rgba)
}

/// Encode a pixel buffer as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MattingError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| MattingError::Processing(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(matches!(err, MattingError::Decode(_)));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn encode_then_decode_preserves_pixels() {
        let mut buffer = RgbaImage::new(3, 2);
        buffer.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        buffer.put_pixel(2, 1, Rgba([200, 100, 50, 128]));

        let png = encode_png(&buffer).unwrap();
        let decoded = decode_image(&png).unwrap();

        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([200, 100, 50, 128]));
    }
}
