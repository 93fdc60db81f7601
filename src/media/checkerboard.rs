//! Removal of baked-in transparency checkerboards from PNG cutouts.
//!
//! This is per-pixel color keying with no spatial awareness: near-white
//! pixels and pixels inside a neutral light-gray band get alpha 0, everything
//! else is left alone. Genuinely white or gray foreground (a white coat, say)
//! is keyed out too; the thresholds are a heuristic without ground truth.

use crate::config::CheckerboardConfig;
use crate::outcome::{Outcome, SkipReason};
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Pixel counts for one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedImage {
    pub path: PathBuf,
    pub cleared: usize,
    pub total: usize,
}

/// Whether a color looks like part of a checkerboard background.
pub fn is_checkerboard([r, g, b]: [u8; 3], config: &CheckerboardConfig) -> bool {
    let white = [r, g, b].iter().all(|&c| c > config.white_threshold);
    if white {
        return true;
    }
    let in_band = [r, g, b]
        .iter()
        .all(|&c| c >= config.gray_min && c < config.gray_max);
    let spread = r.max(g).max(b) - r.min(g).min(b);
    in_band && spread < config.gray_tolerance
}

/// Set alpha to 0 on every checkerboard pixel; returns how many were cleared.
pub fn key_out(img: &mut RgbaImage, config: &CheckerboardConfig) -> usize {
    let mut cleared = 0;
    for pixel in img.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if is_checkerboard([r, g, b], config) {
            pixel.0[3] = 0;
            cleared += 1;
        }
    }
    cleared
}

/// Key out one file and overwrite it in place as PNG.
#[instrument(level = "info", skip(config))]
pub fn remove_checkerboard(
    path: &Path,
    config: &CheckerboardConfig,
) -> Result<KeyedImage, SkipReason> {
    if !path.exists() {
        return Err(SkipReason::NotFound(path.display().to_string()));
    }

    let mut img = image::open(path)?.to_rgba8();
    let cleared = key_out(&mut img, config);
    img.save_with_format(path, ImageFormat::Png)?;

    let total = (img.width() as usize) * (img.height() as usize);
    info!(cleared, total, "Processed image");
    Ok(KeyedImage {
        path: path.to_path_buf(),
        cleared,
        total,
    })
}

/// Process every file; missing or unreadable files are skipped.
pub fn remove_checkerboards(
    paths: &[PathBuf],
    config: &CheckerboardConfig,
) -> Vec<Outcome<KeyedImage>> {
    paths
        .iter()
        .map(|path| match remove_checkerboard(path, config) {
            Ok(keyed) => Outcome::Done(keyed),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Skipping image");
                Outcome::skipped(path.display().to_string(), reason)
            }
        })
        .collect()
}
