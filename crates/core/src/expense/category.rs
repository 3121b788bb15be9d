//! Mapping from free-form expense categories to allocation buckets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the engine treats a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Common expense, distributed by participation mills.
    General,
    /// Elevator expense, distributed by elevator mills.
    Elevator,
    /// Heating expense, routed through the heating splitter.
    Heating,
    /// Anything else; joins the general pool.
    Other,
}

/// Category-name lookup table supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    entries: HashMap<String, CategoryKind>,
}

impl CategoryMap {
    /// Creates an empty map. Every category resolves as unknown.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces a mapping. Names are matched case-insensitively.
    #[must_use]
    pub fn with(mut self, category: &str, kind: CategoryKind) -> Self {
        self.entries.insert(normalize(category), kind);
        self
    }

    /// Looks up a category; `None` when the table has no entry for it.
    #[must_use]
    pub fn resolve(&self, category: &str) -> Option<CategoryKind> {
        self.entries.get(&normalize(category)).copied()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        let general = [
            "cleaning",
            "electricity",
            "water",
            "maintenance",
            "insurance",
            "gardening",
            "management",
            "repairs",
            "security",
        ];

        let map = general
            .into_iter()
            .fold(Self::empty(), |map, name| map.with(name, CategoryKind::General));

        map.with("elevator", CategoryKind::Elevator)
            .with("heating", CategoryKind::Heating)
            .with("heating_oil", CategoryKind::Heating)
            .with("natural_gas", CategoryKind::Heating)
            .with("other", CategoryKind::Other)
    }
}

fn normalize(category: &str) -> String {
    category.trim().to_lowercase()
}
