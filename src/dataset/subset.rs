//! Index-restricted view over a [`CaltechDataset`].

use std::sync::Arc;

use burn::data::dataset::Dataset;
use image::RgbImage;

use super::caltech::{CaltechDataset, CaltechItem};
use crate::utils::error::{CaltechError, Result};

/// The samples of a dataset at the given indices, in the given order
#[derive(Debug, Clone)]
pub struct DatasetSubset {
    dataset: Arc<CaltechDataset>,
    indices: Vec<usize>,
}

impl DatasetSubset {
    /// Fails with `IndexOutOfRange` if any index is outside the dataset
    pub fn new(dataset: Arc<CaltechDataset>, indices: Vec<usize>) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= dataset.len()) {
            return Err(CaltechError::IndexOutOfRange {
                index,
                len: dataset.len(),
            });
        }

        Ok(Self { dataset, indices })
    }

    /// Sample at position `index` of the subset
    pub fn get(&self, index: usize) -> Result<(RgbImage, usize)> {
        let &inner = self.indices.get(index).ok_or(CaltechError::IndexOutOfRange {
            index,
            len: self.indices.len(),
        })?;
        CaltechDataset::get(&self.dataset, inner)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices into the underlying dataset
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn dataset(&self) -> &CaltechDataset {
        &self.dataset
    }
}

impl Dataset<CaltechItem> for DatasetSubset {
    fn get(&self, index: usize) -> Option<CaltechItem> {
        let inner = *self.indices.get(index)?;
        Dataset::<CaltechItem>::get(self.dataset.as_ref(), inner)
    }

    fn len(&self) -> usize {
        self.indices.len()
    }
}
