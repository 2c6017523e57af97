//! Image loading from disk.
//!
//! Every image is read through a buffered handle that is dropped as soon as
//! decoding finishes, then converted to 3-channel RGB whatever its source
//! encoding.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use image::{ImageReader, RgbImage};

use crate::utils::error::Result;

/// Decodes an image file into RGB8
///
/// Missing files surface as `CaltechError::Io`, undecodable ones as
/// `CaltechError::Image`.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let file = File::open(path)?;
    let img = ImageReader::new(BufReader::new(file))
        .with_guessed_format()?
        .decode()?;
    Ok(img.to_rgb8())
}

/// Resolves manifest paths against an image root and loads them
#[derive(Debug, Clone)]
pub struct ImageLoader {
    root_dir: PathBuf,
}

impl ImageLoader {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Gets the full path for an image
    ///
    /// Manifest paths always resolve under the root; a leading `/` (or drive
    /// prefix) is dropped instead of replacing the root.
    pub fn full_path(&self, path: &Path) -> PathBuf {
        let relative = path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)));

        let mut full = self.root_dir.clone();
        full.extend(relative);
        full
    }

    /// Loads an image given a path relative to the root
    pub fn load(&self, path: &Path) -> Result<RgbImage> {
        load_rgb(&self.full_path(path))
    }
}
