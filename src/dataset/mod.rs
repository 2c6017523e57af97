//! Dataset module for Caltech-101 style data
//!
//! This module provides functionality for:
//! - Parsing split manifests (`train.txt`, `test.txt`) into labeled entries
//! - Loading images as RGB, eagerly or on demand
//! - Stratified per-class splitting of sample indices
//!
//! ## Layout
//!
//! ```text
//! Caltech101/
//! ├── train.txt
//! ├── test.txt
//! └── 101_ObjectCategories/
//!     ├── accordion/
//!     │   └── image_0001.jpg
//!     └── ...
//! ```
//!
//! Manifest lines are paths relative to `101_ObjectCategories`.

pub mod caltech;
pub mod loader;
pub mod manifest;
pub mod split;
pub mod subset;

// Re-export main types for convenience
pub use caltech::{CaltechDataset, CaltechItem, DatasetStats, ImageTransform, TargetTransform};
pub use loader::{load_rgb, ImageLoader};
pub use manifest::{ClassRegistry, Manifest, ManifestEntry};
pub use split::{stratified_split, SplitStats, StratifiedSplit};
pub use subset::DatasetSubset;

/// Class whose manifest lines are dropped entirely
pub const BACKGROUND_CLASS: &str = "BACKGROUND_Google";

/// Number of object classes in Caltech-101 once the background class is excluded
pub const NUM_CLASSES: usize = 101;
