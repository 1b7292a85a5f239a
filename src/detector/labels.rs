// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class id to label lookup supplied alongside the model

use anyhow::{Context, Result};
use std::path::Path;

/// Class names indexed by class id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load labels from a file, one label per line (blank lines skipped)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels from {}", path.display()))?;

        let table = Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        if table.is_empty() {
            anyhow::bail!("Label file {} contains no labels", path.display());
        }
        Ok(table)
    }

    /// Load labels from an existing file path, or a comma-separated list
    pub fn load(source: &str) -> Result<Self> {
        let source = source.trim();
        if Path::new(source).is_file() {
            return Self::from_file(source);
        }

        let table = Self::new(source.split(',').map(str::trim).filter(|s| !s.is_empty()));
        if table.is_empty() {
            anyhow::bail!("Label list '{}' contains no labels", source);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label for a class id
    ///
    /// With no table at all every class resolves to `fallback`. Ids past the
    /// end of a non-empty table resolve to `class_<id>`.
    pub fn resolve(&self, class_id: usize, fallback: &str) -> String {
        if self.names.is_empty() {
            return fallback.to_string();
        }
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}
