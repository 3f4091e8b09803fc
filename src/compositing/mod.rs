mod codec;
mod composite;
mod crop;
mod matte;

pub use codec::{decode_image, encode_png};
pub use composite::apply_matte;
pub use crop::{content_bounds, crop_to_content, Bounds};
pub use matte::matte_to_alpha;
