//! # Caltech Dataset
//!
//! Loads Caltech-101 style image classification splits and partitions them
//! per class.
//!
//! ## Modules
//!
//! - `dataset`: Manifest parsing, image loading, the indexable dataset and
//!   stratified splitting
//! - `config`: Dataset configuration, buildable in code or from TOML
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use caltech_dataset::CaltechDataset;
//!
//! // Reads Caltech101/train.txt, images under Caltech101/101_ObjectCategories
//! let dataset = CaltechDataset::open("Caltech101/101_ObjectCategories", "train")?;
//! let (image, label) = dataset.get(0)?;
//!
//! // Half of every class for training, the rest for validation
//! let split = dataset.stratified_subsets(0.5)?;
//! ```

pub mod config;
pub mod dataset;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{CaltechConfig, LoadStrategy};
pub use dataset::{
    stratified_split, CaltechDataset, CaltechItem, DatasetSubset, StratifiedSplit,
    BACKGROUND_CLASS,
};
pub use utils::error::{CaltechError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
