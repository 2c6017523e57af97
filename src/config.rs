//! Configuration for building a Caltech dataset.
//!
//! A config can be built in code with the `with_*` methods or read from a
//! TOML file:
//!
//! ```toml
//! root = "Caltech101/101_ObjectCategories"
//! split = "train"
//! load = "lazy"
//! workers = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{CaltechError, Result, ResultExt};

/// When sample images are decoded
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Decode every image while the dataset is constructed
    #[default]
    Eager,
    /// Decode on first access and cache the result per index
    Lazy,
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStrategy::Eager => write!(f, "eager"),
            LoadStrategy::Lazy => write!(f, "lazy"),
        }
    }
}

/// Configuration for [`CaltechDataset`](crate::dataset::CaltechDataset)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaltechConfig {
    /// Directory the manifest paths are relative to
    pub root: PathBuf,
    /// Split name; the manifest file is `<split>.txt`
    pub split: String,
    /// Directory holding the manifest. Defaults to the parent of `root`.
    #[serde(default)]
    pub manifest_dir: Option<PathBuf>,
    /// Image loading strategy
    #[serde(default)]
    pub load: LoadStrategy,
    /// Number of threads for eager loading (None = rayon default)
    #[serde(default)]
    pub workers: Option<usize>,
    /// Show a progress bar during eager loading
    #[serde(default)]
    pub show_progress: bool,
}

impl CaltechConfig {
    /// Creates a config with default loading options
    pub fn new(root: impl Into<PathBuf>, split: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            split: split.into(),
            manifest_dir: None,
            load: LoadStrategy::default(),
            workers: None,
            show_progress: false,
        }
    }

    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    pub fn with_load_strategy(mut self, load: LoadStrategy) -> Self {
        self.load = load;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Path of the manifest file this config selects
    ///
    /// Without an explicit `manifest_dir` the manifest is expected one level
    /// above `root`.
    pub fn manifest_path(&self) -> PathBuf {
        let dir = match &self.manifest_dir {
            Some(dir) => dir.as_path(),
            None => self.root.parent().unwrap_or(&self.root),
        };
        dir.join(format!("{}.txt", self.split))
    }

    /// Checks option values that would make construction meaningless
    pub fn validate(&self) -> Result<()> {
        if self.split.trim().is_empty() {
            return Err(CaltechError::Config("Split name must not be empty".to_string()));
        }

        if self.workers == Some(0) {
            return Err(CaltechError::Config(
                "Worker count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads a config from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }
}
