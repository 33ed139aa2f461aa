//! What a button shows: its description text, or the image it points at

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::slots::default_description;

const IMAGE_EXTENSIONS: [&str; 5] = ["gif", "png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonFace {
    Text { label: String },
    Image { path: PathBuf },
}

impl ButtonFace {
    /// Face for the slot at global `index` with the given description
    pub fn for_slot(index: usize, description: &str) -> Self {
        let path = Path::new(description);
        if !description.is_empty() && is_image_file(path) {
            return Self::Image {
                path: path.to_path_buf(),
            };
        }

        let label = if description.is_empty() {
            default_description(index)
        } else {
            description.to_string()
        };
        Self::Text { label }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// An existing file with an image extension whose header decodes
fn is_image_file(path: &Path) -> bool {
    has_image_extension(path) && path.is_file() && image::image_dimensions(path).is_ok()
}
