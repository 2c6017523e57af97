//! Caltech-101 dataset built from a split manifest
//!
//! The dataset owns one entry per manifest line (background lines excluded),
//! in manifest order. Images are decoded either up front or on first access,
//! depending on the configured [`LoadStrategy`].

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use burn::data::dataset::Dataset;
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::loader::ImageLoader;
use super::manifest::{ClassRegistry, Manifest, ManifestEntry};
use super::split::{stratified_split, StratifiedSplit};
use super::subset::DatasetSubset;
use crate::config::{CaltechConfig, LoadStrategy};
use crate::utils::error::{CaltechError, Result};
use crate::utils::logging::load_progress_bar;

/// Mapping applied to an image at access time
pub type ImageTransform = Arc<dyn Fn(RgbImage) -> RgbImage + Send + Sync>;

/// Mapping applied to a label at access time
pub type TargetTransform = Arc<dyn Fn(usize) -> usize + Send + Sync>;

/// A single sample handed to a training loop
#[derive(Debug, Clone)]
pub struct CaltechItem {
    pub image: RgbImage,
    pub label: usize,
}

enum ImageStore {
    Eager(Vec<RgbImage>),
    Lazy(Vec<OnceLock<RgbImage>>),
}

/// Indexable (image, label) collection for one Caltech split
pub struct CaltechDataset {
    config: CaltechConfig,
    loader: ImageLoader,
    entries: Vec<ManifestEntry>,
    classes: ClassRegistry,
    images: ImageStore,
    transform: Option<ImageTransform>,
    target_transform: Option<TargetTransform>,
}

impl CaltechDataset {
    /// Builds the dataset described by `config`
    ///
    /// Fails if the manifest is missing or any listed image is missing. With
    /// eager loading an undecodable image also fails construction.
    pub fn new(config: CaltechConfig) -> Result<Self> {
        config.validate()?;

        let manifest_path = config.manifest_path();
        info!(
            "Loading Caltech split '{}' from {:?} (images under {:?})",
            config.split, manifest_path, config.root
        );

        let Manifest { entries, classes } = Manifest::from_file(&manifest_path)?;
        info!(
            "Manifest lists {} samples in {} classes",
            entries.len(),
            classes.len()
        );

        let loader = ImageLoader::new(&config.root);
        let images = match config.load {
            LoadStrategy::Eager => ImageStore::Eager(load_all(&loader, &entries, &config)?),
            LoadStrategy::Lazy => {
                for entry in &entries {
                    fs::metadata(loader.full_path(&entry.relative_path))?;
                }
                ImageStore::Lazy(entries.iter().map(|_| OnceLock::new()).collect())
            }
        };

        Ok(Self {
            config,
            loader,
            entries,
            classes,
            images,
            transform: None,
            target_transform: None,
        })
    }

    /// Shorthand for an eagerly loaded split whose manifest sits next to `root`
    pub fn open(root: impl Into<PathBuf>, split: impl Into<String>) -> Result<Self> {
        Self::new(CaltechConfig::new(root, split))
    }

    /// Sets the mapping applied to every image returned by [`get`](Self::get)
    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(RgbImage) -> RgbImage + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    /// Sets the mapping applied to every label returned by [`get`](Self::get)
    pub fn with_target_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> usize + Send + Sync + 'static,
    {
        self.target_transform = Some(Arc::new(f));
        self
    }

    /// Returns the (image, label) pair at `index` with transforms applied
    pub fn get(&self, index: usize) -> Result<(RgbImage, usize)> {
        let entry = self.entries.get(index).ok_or(CaltechError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;

        let image = self.image_at(index, entry)?;
        let image = match &self.transform {
            Some(transform) => transform(image),
            None => image,
        };

        let label = match &self.target_transform {
            Some(transform) => transform(entry.label),
            None => entry.label,
        };

        Ok((image, label))
    }

    fn image_at(&self, index: usize, entry: &ManifestEntry) -> Result<RgbImage> {
        match &self.images {
            ImageStore::Eager(images) => Ok(images[index].clone()),
            ImageStore::Lazy(cells) => {
                let cell = &cells[index];
                if let Some(image) = cell.get() {
                    return Ok(image.clone());
                }

                let loaded = self.loader.load(&entry.relative_path)?;
                debug!("Cached image {} ({:?})", index, entry.relative_path);
                Ok(cell.get_or_init(|| loaded).clone())
            }
        }
    }

    /// Number of (non-background) samples
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &CaltechConfig {
        &self.config
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class names ordered by class id
    pub fn class_names(&self) -> &[String] {
        self.classes.names()
    }

    pub fn class_id(&self, name: &str) -> Option<usize> {
        self.classes.id(name)
    }

    pub fn class_name(&self, id: usize) -> Option<&str> {
        self.classes.name(id)
    }

    /// Raw label at `index`, without the target transform
    pub fn label(&self, index: usize) -> Option<usize> {
        self.entries.get(index).map(|e| e.label)
    }

    /// Raw labels in sample order
    pub fn labels(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.label).collect()
    }

    /// Full image path of the sample at `index`
    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.entries
            .get(index)
            .map(|e| self.loader.full_path(&e.relative_path))
    }

    /// Splits sample indices per class; see [`stratified_split`]
    pub fn stratified_subsets(&self, percentage: f64) -> Result<StratifiedSplit> {
        let split = stratified_split(&self.labels(), percentage)?;
        debug!(
            "Stratified split at {}: {} / {}",
            percentage,
            split.first().len(),
            split.second().len()
        );
        Ok(split)
    }

    /// Stratified split materialized as two dataset views
    pub fn split_subsets(
        self: &Arc<Self>,
        percentage: f64,
    ) -> Result<(DatasetSubset, DatasetSubset)> {
        let (first, second) = self.stratified_subsets(percentage)?.into_parts();
        Ok((
            DatasetSubset::new(Arc::clone(self), first)?,
            DatasetSubset::new(Arc::clone(self), second)?,
        ))
    }

    /// Get statistics about the dataset
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for entry in &self.entries {
            class_counts[entry.label] += 1;
        }

        DatasetStats {
            split: self.config.split.clone(),
            total_samples: self.entries.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names: self.classes.names().to_vec(),
        }
    }
}

fn load_all(
    loader: &ImageLoader,
    entries: &[ManifestEntry],
    config: &CaltechConfig,
) -> Result<Vec<RgbImage>> {
    let start = Instant::now();
    let pb = load_progress_bar(entries.len(), config.show_progress);

    let load = || -> Result<Vec<RgbImage>> {
        entries
            .par_iter()
            .map(|entry| {
                let image = loader.load(&entry.relative_path);
                pb.inc(1);
                image
            })
            .collect()
    };

    let images = match config.workers {
        Some(workers) => rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| CaltechError::Config(format!("Failed to build thread pool: {}", e)))?
            .install(load),
        None => load(),
    };

    match &images {
        Ok(images) => {
            pb.finish_and_clear();
            info!(
                "Loaded {} images in {}",
                images.len(),
                crate::utils::format_duration(start.elapsed().as_secs_f64())
            );
        }
        Err(e) => {
            pb.abandon();
            warn!("Image loading failed: {}", e);
        }
    }

    images
}

impl std::fmt::Debug for CaltechDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaltechDataset")
            .field("config", &self.config)
            .field("len", &self.entries.len())
            .field("num_classes", &self.classes.len())
            .field("transform", &self.transform.is_some())
            .field("target_transform", &self.target_transform.is_some())
            .finish()
    }
}

impl Dataset<CaltechItem> for CaltechDataset {
    fn get(&self, index: usize) -> Option<CaltechItem> {
        match CaltechDataset::get(self, index) {
            Ok((image, label)) => Some(CaltechItem { image, label }),
            Err(CaltechError::IndexOutOfRange { .. }) => None,
            Err(e) => {
                warn!("Failed to load sample {}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Statistics about the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub split: String,
    pub total_samples: usize,
    pub num_classes: usize,
    /// Indexed by class id
    pub class_counts: Vec<usize>,
    /// Indexed by class id
    pub class_names: Vec<String>,
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset Statistics ({}):", self.split)?;
        writeln!(f, "  Total samples: {}", self.total_samples)?;
        writeln!(f, "  Number of classes: {}", self.num_classes)?;
        writeln!(f, "  Samples per class:")?;
        for (idx, (name, count)) in self.class_names.iter().zip(&self.class_counts).enumerate() {
            writeln!(f, "    {:3}. {:30} {:5}", idx, name, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Writes `<tmp>/<split>.txt` and the images it lists under `<tmp>/images`
    ///
    /// Every image is 2x2 and filled with a colour derived from its line number
    /// so tests can tell samples apart.
    pub(crate) fn write_fixture(split: &str, lines: &[&str]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("images");
        fs::create_dir_all(&root).unwrap();

        for (i, line) in lines.iter().enumerate() {
            let path = root.join(line);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let shade = (i * 10) as u8;
            image::ImageBuffer::from_fn(2, 2, |_, _| image::Rgb([shade, 0u8, 255u8]))
                .save(&path)
                .unwrap();
        }

        fs::write(dir.path().join(format!("{split}.txt")), lines.join("\n")).unwrap();
        (dir, root)
    }

    #[test]
    fn test_first_occurrence_labels() {
        let (_dir, root) = write_fixture("train", &["catA/1.png", "catB/1.png", "catA/2.png"]);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.class_id("catA"), Some(0));
        assert_eq!(dataset.class_id("catB"), Some(1));
        assert_eq!(dataset.labels(), vec![0, 1, 0]);
    }

    #[test]
    fn test_background_excluded() {
        let (_dir, root) = write_fixture("train", &["BACKGROUND_Google/1.png", "catA/1.png"]);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.class_id("catA"), Some(0));
        assert_eq!(dataset.num_classes(), 1);
    }

    #[test]
    fn test_get_returns_image_and_label_in_manifest_order() {
        let (_dir, root) = write_fixture("test", &["ant/a.png", "bass/b.png", "ant/c.png"]);
        let dataset = CaltechDataset::open(&root, "test").unwrap();

        let (image, label) = dataset.get(2).unwrap();
        assert_eq!(label, 0);
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [20, 0, 255]);
    }

    #[test]
    fn test_get_out_of_range() {
        let (_dir, root) = write_fixture("train", &["ant/a.png"]);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        let err = dataset.get(1).unwrap_err();
        assert!(matches!(
            err,
            CaltechError::IndexOutOfRange { index: 1, len: 1 }
        ));
        assert!(Dataset::<CaltechItem>::get(&dataset, 1).is_none());
    }

    #[test]
    fn test_transforms_applied_independently() {
        let (_dir, root) = write_fixture("train", &["ant/a.png", "bass/b.png"]);
        let plain = CaltechDataset::open(&root, "train").unwrap();
        let transformed = CaltechDataset::open(&root, "train")
            .unwrap()
            .with_transform(|mut img| {
                img.put_pixel(0, 0, image::Rgb([1, 2, 3]));
                img
            })
            .with_target_transform(|label| label + 100);

        let (raw_image, raw_label) = plain.get(1).unwrap();
        let (image, label) = transformed.get(1).unwrap();

        assert_eq!(raw_label, 1);
        assert_eq!(label, 101);
        assert_eq!(raw_image.get_pixel(0, 0).0, [10, 0, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(image.get_pixel(1, 1), raw_image.get_pixel(1, 1));
        assert_eq!(transformed.label(1), Some(1));
    }

    #[test]
    fn test_image_transform_alone_keeps_label() {
        let (_dir, root) = write_fixture("train", &["ant/a.png", "bass/b.png"]);
        let dataset = CaltechDataset::open(&root, "train")
            .unwrap()
            .with_transform(|img| image::imageops::resize(&img, 4, 4, image::imageops::FilterType::Nearest));

        let (image, label) = dataset.get(1).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(label, 1);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("images");
        let err = CaltechDataset::open(&root, "train").unwrap_err();
        assert!(matches!(err, CaltechError::Io(_)));
    }

    #[test]
    fn test_missing_image_fails_construction() {
        let (dir, root) = write_fixture("train", &["ant/a.png"]);
        fs::write(dir.path().join("train.txt"), "ant/a.png\nant/missing.png\n").unwrap();

        let eager = CaltechDataset::open(&root, "train").unwrap_err();
        assert!(matches!(eager, CaltechError::Io(_)));

        let lazy = CaltechDataset::new(
            CaltechConfig::new(&root, "train").with_load_strategy(LoadStrategy::Lazy),
        )
        .unwrap_err();
        assert!(matches!(lazy, CaltechError::Io(_)));
    }

    #[test]
    fn test_lazy_matches_eager() {
        let lines = ["ant/a.png", "bass/b.png", "ant/c.png", "crab/d.png"];
        let (_dir, root) = write_fixture("train", &lines);

        let eager = CaltechDataset::new(CaltechConfig::new(&root, "train").with_workers(2)).unwrap();
        let lazy = CaltechDataset::new(
            CaltechConfig::new(&root, "train").with_load_strategy(LoadStrategy::Lazy),
        )
        .unwrap();

        assert_eq!(eager.len(), lazy.len());
        for i in 0..eager.len() {
            let (a, la) = eager.get(i).unwrap();
            let (b, lb) = lazy.get(i).unwrap();
            assert_eq!(la, lb);
            assert_eq!(a, b);
        }

        // decoded images stay cached after the file is gone
        fs::remove_file(lazy.path(3).unwrap()).unwrap();
        let (cached, label) = lazy.get(3).unwrap();
        assert_eq!(label, 2);
        assert_eq!(cached.get_pixel(0, 0).0, [30, 0, 255]);
    }

    #[test]
    fn test_explicit_manifest_dir() {
        let (dir, root) = write_fixture("train", &["ant/a.png"]);
        let splits = dir.path().join("splits");
        fs::create_dir_all(&splits).unwrap();
        fs::write(splits.join("custom.txt"), "ant/a.png\nant/a.png\n").unwrap();

        let dataset =
            CaltechDataset::new(CaltechConfig::new(&root, "custom").with_manifest_dir(&splits))
                .unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_stratified_subsets_worked_example() {
        let lines = [
            "A/0.png", "A/1.png", "A/2.png", "A/3.png", "B/0.png", "B/1.png",
        ];
        let (_dir, root) = write_fixture("train", &lines);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        let split = dataset.stratified_subsets(0.5).unwrap();
        assert_eq!(split.first(), &[0, 1, 4]);
        assert_eq!(split.second(), &[2, 3, 5]);
        assert_eq!(dataset.stratified_subsets(0.5).unwrap(), split);

        assert!(matches!(
            dataset.stratified_subsets(1.5),
            Err(CaltechError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stats_and_paths() {
        let (_dir, root) = write_fixture("train", &["ant/a.png", "bass/b.png", "ant/c.png"]);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        let stats = dataset.stats();
        assert_eq!(stats.total_samples, 3);
        assert_eq!(stats.class_counts, vec![2, 1]);
        assert_eq!(stats.class_names, vec!["ant", "bass"]);
        assert!(stats.to_string().contains("Number of classes: 2"));

        assert_eq!(dataset.path(1), Some(root.join(Path::new("bass/b.png"))));
        assert_eq!(dataset.path(3), None);
        assert_eq!(dataset.class_name(1), Some("bass"));
    }

    #[test]
    fn test_burn_dataset_trait() {
        let (_dir, root) = write_fixture("train", &["ant/a.png", "bass/b.png"]);
        let dataset = CaltechDataset::open(&root, "train").unwrap();

        let items: Vec<CaltechItem> = dataset.iter().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].label, 1);
    }
}
