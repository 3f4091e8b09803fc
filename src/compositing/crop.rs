use image::{imageops, RgbaImage};

/// Axis-aligned content rectangle within a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Find the minimal rectangle containing every pixel with alpha > 0.
///
/// Single pass over the buffer. Returns `None` when no pixel has any
/// opacity; boundary pixels are inclusive.
pub fn content_bounds(image: &RgbaImage) -> Option<Bounds> {
    let (width, height) = image.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut has_content = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > 0 {
            has_content = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !has_content {
        return None;
    }

    Some(Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Crop a buffer to its content bounds, or `None` if fully transparent.
pub fn crop_to_content(image: &RgbaImage) -> Option<RgbaImage> {
    let bounds = content_bounds(image)?;
    Some(imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image())
}
