//! Split manifest parsing
//!
//! A manifest lists one image per line as `<class_name>/<instance>`, relative
//! to the image root. Class ids are handed out in order of first appearance.
//! Lines starting with the background class name are dropped before any id is
//! assigned.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BACKGROUND_CLASS;
use crate::utils::error::Result;

/// Class-name to class-id mapping, filled in first-seen order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRegistry {
    class_to_idx: HashMap<String, usize>,
    idx_to_class: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, registering it with the next free id if unseen
    pub fn register(&mut self, name: &str) -> usize {
        if let Some(&id) = self.class_to_idx.get(name) {
            return id;
        }

        let id = self.idx_to_class.len();
        self.class_to_idx.insert(name.to_string(), id);
        self.idx_to_class.push(name.to_string());
        debug!("Registered class '{}' as {}", name, id);
        id
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.class_to_idx.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.idx_to_class.get(id).map(String::as_str)
    }

    /// Class names ordered by id
    pub fn names(&self) -> &[String] {
        &self.idx_to_class
    }

    pub fn len(&self) -> usize {
        self.idx_to_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx_to_class.is_empty()
    }
}

/// One manifest line that survived filtering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the image root, as written in the manifest
    pub relative_path: PathBuf,
    /// Class id assigned by the registry
    pub label: usize,
}

/// Parsed manifest: ordered entries plus the class registry they were labeled with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
    pub classes: ClassRegistry,
}

impl Manifest {
    /// Reads and parses a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parses manifest text
    pub fn parse(content: &str) -> Self {
        let mut classes = ClassRegistry::new();
        let entries = parse_lines(content, &mut classes);
        Self { entries, classes }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in manifest order
    pub fn labels(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.label).collect()
    }
}

/// Class name of a manifest line: the text before the first `/`
pub fn class_name_of(line: &str) -> &str {
    line.split('/').next().unwrap_or(line)
}

fn parse_lines(content: &str, classes: &mut ClassRegistry) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();
    let mut skipped_background = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(BACKGROUND_CLASS) {
            skipped_background += 1;
            continue;
        }

        let label = classes.register(class_name_of(line));
        entries.push(ManifestEntry {
            relative_path: PathBuf::from(line),
            label,
        });
    }

    if skipped_background > 0 {
        debug!("Skipped {} {} lines", skipped_background, BACKGROUND_CLASS);
    }

    entries
}
