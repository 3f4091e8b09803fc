use image::RgbaImage;

/// Convert a grayscale matte into a translucency mask.
///
/// The service returns the matte as a grayscale image (black = background,
/// white = foreground). Each pixel's alpha is overwritten with its red
/// channel sample, a direct byte copy with no normalization or
/// thresholding. RGB channels are left as-is; the compositor only reads
/// the alpha.
pub fn matte_to_alpha(matte: &RgbaImage) -> RgbaImage {
    let mut converted = matte.clone();
    for pixel in converted.pixels_mut() {
        pixel[3] = pixel[0];
    }
    converted
}
