//! Splitting side-by-side before/after photos into two images.
//!
//! The split point is `width / 2`, so for odd widths the left half is one
//! pixel narrower than the right. Sources with an alpha channel (including
//! palette PNGs with transparency) are flattened to RGB first; JPEG outputs
//! are written at the configured quality.

use crate::config::BisectConfig;
use crate::models::GalleryItem;
use crate::outcome::{Outcome, SkipReason};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Files written for one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    pub before: PathBuf,
    pub after: PathBuf,
    pub width: u32,
    pub height: u32,
    pub left_width: u32,
}

/// Drop the alpha channel, if any.
pub fn normalize(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    }
}

/// Crop the left and right halves at the integer midpoint.
pub fn bisect(img: &DynamicImage) -> (DynamicImage, DynamicImage) {
    let (width, height) = img.dimensions();
    let mid = width / 2;
    let left = img.crop_imm(0, 0, mid, height);
    let right = img.crop_imm(mid, 0, width - mid, height);
    (left, right)
}

/// Save an image; `.jpg`/`.jpeg` paths use the given quality, others use the
/// format implied by the extension.
pub fn save_image(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), SkipReason> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));

    if is_jpeg {
        let mut writer = BufWriter::new(File::create(path)?);
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        writer.flush()?;
    } else {
        img.save(path)?;
    }
    Ok(())
}

/// Split one image file into `before` (left) and `after` (right).
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn split_file(
    input: &Path,
    before: &Path,
    after: &Path,
    quality: u8,
) -> Result<SplitOutput, SkipReason> {
    if !input.exists() {
        return Err(SkipReason::NotFound(input.display().to_string()));
    }

    let img = normalize(image::open(input)?);
    let (width, height) = img.dimensions();
    info!(width, height, "Original size");

    let (left, right) = bisect(&img);
    save_image(&left, before, quality)?;
    info!(path = %before.display(), "Saved before image");
    save_image(&right, after, quality)?;
    info!(path = %after.display(), "Saved after image");

    Ok(SplitOutput {
        before: before.to_path_buf(),
        after: after.to_path_buf(),
        width,
        height,
        left_width: left.width(),
    })
}

/// Find `{dir}/{name}.{ext}` trying extensions in order.
pub fn resolve_source(dir: &Path, name: &str, extensions: &[String]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
}

/// Inputs for a batch split.
///
/// With `names`, each name is resolved by extension fallback and a missing
/// one becomes a skip. Without names, every JPEG/PNG in `source_dir` is used
/// in sorted order.
///
/// # Errors
///
/// Fails only when `source_dir` cannot be listed.
pub fn batch_inputs(
    source_dir: &Path,
    names: &[String],
    extensions: &[String],
) -> Result<Vec<Outcome<PathBuf>>, Box<dyn Error>> {
    if !names.is_empty() {
        return Ok(names
            .iter()
            .map(|name| match resolve_source(source_dir, name, extensions) {
                Some(path) => Outcome::Done(path),
                None => Outcome::skipped(
                    name,
                    SkipReason::NotFound(source_dir.join(name).display().to_string()),
                ),
            })
            .collect());
    }

    let mut files = std::fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files.into_iter().map(Outcome::Done).collect())
}

/// Split every input into `meta_{id}_before.jpg` / `meta_{id}_after.jpg`.
///
/// Ids count up from `config.start_id` and advance only on success.
#[instrument(level = "info", skip_all, fields(target = %target_dir.display()))]
pub fn split_batch(
    inputs: Vec<Outcome<PathBuf>>,
    target_dir: &Path,
    config: &BisectConfig,
) -> Vec<Outcome<GalleryItem>> {
    let mut next_id = config.start_id;
    let mut outcomes = Vec::with_capacity(inputs.len());

    for input in inputs {
        let path = match input {
            Outcome::Done(path) => path,
            Outcome::Skipped { item, reason } => {
                warn!(%item, %reason, "Skipping input");
                outcomes.push(Outcome::Skipped { item, reason });
                continue;
            }
        };

        let before_name = format!("meta_{next_id}_before.jpg");
        let after_name = format!("meta_{next_id}_after.jpg");
        let result = split_file(
            &path,
            &target_dir.join(&before_name),
            &target_dir.join(&after_name),
            config.quality,
        );

        match result {
            Ok(_) => {
                outcomes.push(Outcome::Done(GalleryItem {
                    id: next_id,
                    before: format!("{}/{}", config.web_prefix, before_name),
                    after: format!("{}/{}", config.web_prefix, after_name),
                    title: format!("Metamorfoza {next_id}"),
                    description: config.description.clone(),
                    motto: config.motto.clone(),
                }));
                next_id += 1;
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Skipping image");
                outcomes.push(Outcome::skipped(path.display().to_string(), reason));
            }
        }
    }

    outcomes
}
