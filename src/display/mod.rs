mod face;
pub mod palette;

pub use face::ButtonFace;
pub use palette::{parse_hex_color, rgb_to_hex, Palette};
