use crate::error::MattingError;
use image::{imageops, RgbaImage};

/// Fuse an original image with an alpha matte, destination-in.
///
/// The output has the original's dimensions; RGB is taken from the
/// original and alpha becomes `min(original.alpha, matte.alpha)` at each
/// coordinate, so the original survives only where the matte is opaque.
/// The matte is resampled (bilinear) to the original's size when the
/// dimensions differ; it never grows the canvas.
pub fn apply_matte(original: &RgbaImage, matte: &RgbaImage) -> Result<RgbaImage, MattingError> {
    if original.width() == 0 || original.height() == 0 {
        return Err(MattingError::Processing("original image has zero area".into()));
    }
    if matte.width() == 0 || matte.height() == 0 {
        return Err(MattingError::Processing("matte has zero area".into()));
    }

    let resampled;
    let matte = if matte.dimensions() != original.dimensions() {
        resampled = imageops::resize(
            matte,
            original.width(),
            original.height(),
            imageops::FilterType::Triangle,
        );
        &resampled
    } else {
        matte
    };

    let mut fused = original.clone();
    for (dst, src) in fused.pixels_mut().zip(matte.pixels()) {
        dst[3] = dst[3].min(src[3]);
    }
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn opaque_matte_is_identity() {
        let original = RgbaImage::from_fn(8, 6, |x, y| {
            Rgba([x as u8 * 10, y as u8 * 20, 33, 255])
        });
        let matte = solid(8, 6, [255, 255, 255, 255]);
        let fused = apply_matte(&original, &matte).unwrap();
        assert_eq!(fused, original);
    }

    #[test]
    fn zero_matte_clears_alpha_keeps_rgb() {
        let original = solid(4, 4, [120, 40, 200, 255]);
        let matte = solid(4, 4, [0, 0, 0, 0]);
        let fused = apply_matte(&original, &matte).unwrap();
        for pixel in fused.pixels() {
            assert_eq!(pixel.0, [120, 40, 200, 0]);
        }
    }

    #[test]
    fn alpha_is_min_of_original_and_matte() {
        let original = solid(2, 2, [10, 10, 10, 100]);
        let matte = solid(2, 2, [0, 0, 0, 180]);
        let fused = apply_matte(&original, &matte).unwrap();
        assert!(fused.pixels().all(|p| p[3] == 100));

        let thin_matte = solid(2, 2, [0, 0, 0, 40]);
        let fused = apply_matte(&original, &thin_matte).unwrap();
        assert!(fused.pixels().all(|p| p[3] == 40));
    }

    #[test]
    fn matte_is_resampled_to_original_dimensions() {
        let original = solid(8, 8, [1, 2, 3, 255]);
        let matte = solid(4, 4, [255, 255, 255, 255]);
        let fused = apply_matte(&original, &matte).unwrap();
        assert_eq!(fused.dimensions(), (8, 8));
        assert!(fused.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn zero_area_input_fails() {
        let empty = RgbaImage::new(0, 0);
        let image = solid(2, 2, [0, 0, 0, 255]);
        assert!(matches!(
            apply_matte(&empty, &image),
            Err(MattingError::Processing(_))
        ));
        assert!(matches!(
            apply_matte(&image, &empty),
            Err(MattingError::Processing(_))
        ));
    }
}
