// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Size category table and diagonal classification
//!
//! The table is an ordered list of `(name, lower_bound)` breakpoints. Each
//! category covers the half-open range `[lower_bound, next_lower_bound)` and
//! the last one is unbounded above, so the table partitions `[0, inf)`.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Default breakpoints in microns
pub const DEFAULT_BREAKPOINTS: &[(&str, f64)] = &[
    ("nanoplastic", 0.0),
    ("small", 1.0),
    ("medium", 100.0),
    ("large", 1000.0),
];

/// A named size range in microns
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCategory {
    pub name: String,
    /// Inclusive lower bound
    pub min_microns: f64,
    /// Exclusive upper bound, `None` for the catch-all category
    pub max_microns: Option<f64>,
}

impl SizeCategory {
    pub fn contains(&self, microns: f64) -> bool {
        microns >= self.min_microns && self.max_microns.map_or(true, |max| microns < max)
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_microns {
            Some(max) => write!(f, "{} [{}, {})", self.name, self.min_microns, max),
            None => write!(f, "{} [{}, inf)", self.name, self.min_microns),
        }
    }
}

/// Validated, ordered size category table
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCategoryTable {
    categories: Vec<SizeCategory>,
}

impl SizeCategoryTable {
    /// Build a table from ordered `(name, lower_bound)` breakpoints
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidCategoryTable` if:
    /// - the table is empty
    /// - the first lower bound is not 0
    /// - a bound is not finite or bounds are not strictly increasing
    /// - a name is empty or repeated
    pub fn from_breakpoints<S: Into<String>>(
        breakpoints: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, ConfigError> {
        let breakpoints: Vec<(String, f64)> = breakpoints
            .into_iter()
            .map(|(name, bound)| (name.into(), bound))
            .collect();

        let invalid = |msg: String| ConfigError::InvalidCategoryTable(msg);

        let first = breakpoints
            .first()
            .ok_or_else(|| invalid("table is empty".to_string()))?;
        if first.1 != 0.0 {
            return Err(invalid(format!(
                "first category '{}' must start at 0, got {}",
                first.0, first.1
            )));
        }

        for (i, (name, bound)) in breakpoints.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(invalid(format!("category #{} has an empty name", i)));
            }
            if !bound.is_finite() {
                return Err(invalid(format!("category '{}' has non-finite bound", name)));
            }
            if breakpoints[..i].iter().any(|(other, _)| other == name) {
                return Err(invalid(format!("duplicate category '{}'", name)));
            }
            if i > 0 && *bound <= breakpoints[i - 1].1 {
                return Err(invalid(format!(
                    "bound of '{}' ({}) must be greater than bound of '{}' ({})",
                    name,
                    bound,
                    breakpoints[i - 1].0,
                    breakpoints[i - 1].1
                )));
            }
        }

        let categories = breakpoints
            .iter()
            .enumerate()
            .map(|(i, (name, bound))| SizeCategory {
                name: name.clone(),
                min_microns: *bound,
                max_microns: breakpoints.get(i + 1).map(|(_, next)| *next),
            })
            .collect();

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[SizeCategory] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Position of a category in table order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    /// The last, unbounded category
    pub fn catch_all(&self) -> &SizeCategory {
        // non-empty by construction
        &self.categories[self.categories.len() - 1]
    }

    /// Classify a diagonal length (microns) into a category
    ///
    /// Boundary values belong to the higher category. Anything at or above
    /// the last breakpoint falls into the catch-all category.
    pub fn classify(&self, diagonal_microns: f64) -> &SizeCategory {
        let idx = self
            .categories
            .partition_point(|c| c.min_microns <= diagonal_microns);
        &self.categories[idx.saturating_sub(1)]
    }
}

impl Default for SizeCategoryTable {
    fn default() -> Self {
        let categories = DEFAULT_BREAKPOINTS
            .iter()
            .enumerate()
            .map(|(i, (name, bound))| SizeCategory {
                name: name.to_string(),
                min_microns: *bound,
                max_microns: DEFAULT_BREAKPOINTS.get(i + 1).map(|(_, next)| *next),
            })
            .collect();
        Self { categories }
    }
}

/// Parses `name:lower,name:lower,...`, e.g. `nanoplastic:0,small:1,medium:100,large:1000`
impl FromStr for SizeCategoryTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut breakpoints = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, bound) = entry.split_once(':').ok_or_else(|| {
                ConfigError::InvalidCategoryTable(format!(
                    "entry '{}' is not in name:lower_bound form",
                    entry
                ))
            })?;
            let bound = bound.trim().parse::<f64>().map_err(|e| {
                ConfigError::InvalidCategoryTable(format!(
                    "bound '{}' of '{}' is not a number: {}",
                    bound.trim(),
                    name.trim(),
                    e
                ))
            })?;
            breakpoints.push((name.trim().to_string(), bound));
        }
        Self::from_breakpoints(breakpoints)
    }
}

/// Classify a diagonal length against a category table
pub fn classify_size(diagonal_microns: f64, table: &SizeCategoryTable) -> &SizeCategory {
    table.classify(diagonal_microns)
}
