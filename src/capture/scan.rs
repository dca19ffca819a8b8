use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub const IMAGE_PREFIX: &str = "image_";
pub const IMAGE_SUFFIX: &str = ".jpg";

pub fn is_image_name(name: &str) -> bool {
    name.starts_with(IMAGE_PREFIX) && name.ends_with(IMAGE_SUFFIX)
}

/// Counts entries in `dir` (not its subdirectories) named `image_*.jpg`.
///
/// Only names are looked at, so a file the pipeline is still writing counts.
pub fn count_images(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut count = 0;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to list directory {}", dir.display()))?;
        if entry.file_name().to_str().is_some_and(is_image_name) {
            count += 1;
        }
    }
    Ok(count)
}
