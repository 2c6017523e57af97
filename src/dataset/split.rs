//! Stratified splitting of sample indices
//!
//! Sample positions are grouped by label, and every group is cut at
//! `ceil(group_len * percentage)`: the head goes to the first split, the tail
//! to the second. Groups keep ascending index order and are emitted in the
//! order their label first appears. There is no shuffling, so the same labels
//! and percentage always produce the same split.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{CaltechError, Result};

/// Two disjoint index lists that together cover `0..n`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedSplit {
    /// Fraction of every class assigned to `first`
    pub percentage: f64,
    first: Vec<usize>,
    second: Vec<usize>,
}

/// Splits `0..labels.len()` per label so that `ceil(len * percentage)` of every
/// label's indices land in the first split
///
/// Fails with `InvalidArgument` when `percentage` is outside `[0, 1]` or NaN.
pub fn stratified_split(labels: &[usize], percentage: f64) -> Result<StratifiedSplit> {
    if !(0.0..=1.0).contains(&percentage) {
        return Err(CaltechError::InvalidArgument(format!(
            "percentage must be within [0, 1], got {}",
            percentage
        )));
    }

    let mut first = Vec::new();
    let mut second = Vec::new();

    for (_, indices) in group_by_label(labels) {
        let n_first = (indices.len() as f64 * percentage).ceil() as usize;
        let n_first = n_first.min(indices.len());
        first.extend_from_slice(&indices[..n_first]);
        second.extend_from_slice(&indices[n_first..]);
    }

    Ok(StratifiedSplit {
        percentage,
        first,
        second,
    })
}

/// Groups sample indices by label, labels in order of first appearance
fn group_by_label(labels: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();

    for (index, &label) in labels.iter().enumerate() {
        let slot = *position.entry(label).or_insert_with(|| {
            groups.push((label, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(index);
    }

    groups
}

impl StratifiedSplit {
    pub fn first(&self) -> &[usize] {
        &self.first
    }

    pub fn second(&self) -> &[usize] {
        &self.second
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>) {
        (self.first, self.second)
    }

    /// Total number of indices across both splits
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    /// Per-class counts of both splits, given the labels the split was computed from
    pub fn stats(&self, labels: &[usize]) -> SplitStats {
        let mut per_class: Vec<ClassSplitCount> = Vec::new();
        let mut position: HashMap<usize, usize> = HashMap::new();

        let mut slot_for = |label: usize, per_class: &mut Vec<ClassSplitCount>| {
            *position.entry(label).or_insert_with(|| {
                per_class.push(ClassSplitCount {
                    label,
                    first: 0,
                    second: 0,
                });
                per_class.len() - 1
            })
        };

        for &index in &self.first {
            if let Some(&label) = labels.get(index) {
                let slot = slot_for(label, &mut per_class);
                per_class[slot].first += 1;
            }
        }
        for &index in &self.second {
            if let Some(&label) = labels.get(index) {
                let slot = slot_for(label, &mut per_class);
                per_class[slot].second += 1;
            }
        }
        per_class.sort_by_key(|c| c.label);

        SplitStats {
            percentage: self.percentage,
            first_size: self.first.len(),
            second_size: self.second.len(),
            per_class,
        }
    }

    /// Save the split to a JSON file for reproducibility
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a split from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Counts for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSplitCount {
    pub label: usize,
    pub first: usize,
    pub second: usize,
}

/// Statistics about a stratified split
#[derive(Debug, Clone)]
pub struct SplitStats {
    pub percentage: f64,
    pub first_size: usize,
    pub second_size: usize,
    /// Sorted by label
    pub per_class: Vec<ClassSplitCount>,
}

impl std::fmt::Display for SplitStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.first_size + self.second_size;
        let share = |n: usize| {
            if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            }
        };

        writeln!(f, "Stratified Split Statistics:")?;
        writeln!(f, "  Percentage: {:.3}", self.percentage)?;
        writeln!(f, "  Total samples: {}", total)?;
        writeln!(f, "  Number of classes: {}", self.per_class.len())?;
        writeln!(
            f,
            "  First split: {} ({:.1}%)",
            self.first_size,
            share(self.first_size)
        )?;
        writeln!(
            f,
            "  Second split: {} ({:.1}%)",
            self.second_size,
            share(self.second_size)
        )?;
        Ok(())
    }
}
