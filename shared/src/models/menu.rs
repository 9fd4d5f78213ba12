//! Menu document: the root of `products.json`

use super::category::Category;
use super::null_as_empty;
use super::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuMetadata {
    pub last_updated: DateTime<Utc>,
    pub total_products: usize,
    pub total_categories: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Counts over the whole document, nested subcategories included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuStats {
    pub total_categories: usize,
    pub total_products: usize,
    pub available_products: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MenuMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuDocument {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            metadata: None,
            extra: Map::new(),
        }
    }

    /// Top-level categories followed by their nested subcategories (depth-first)
    pub fn all_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories
            .iter()
            .flat_map(|c| std::iter::once(c).chain(c.subcategories.iter()))
    }

    /// Lookup by id across top-level and nested categories
    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.all_categories().find(|c| c.id == id)
    }

    pub fn find_category_mut(&mut self, id: &str) -> Option<&mut Category> {
        for category in self.categories.iter_mut() {
            if category.id == id {
                return Some(category);
            }
            if let Some(sub) = category.subcategories.iter_mut().find(|s| s.id == id) {
                return Some(sub);
            }
        }
        None
    }

    pub fn contains_category(&self, id: &str) -> bool {
        self.find_category(id).is_some()
    }

    /// Remove a category wherever it lives in the tree
    pub fn remove_category(&mut self, id: &str) -> Option<Category> {
        if let Some(pos) = self.categories.iter().position(|c| c.id == id) {
            return Some(self.categories.remove(pos));
        }
        for category in self.categories.iter_mut() {
            if let Some(pos) = category.subcategories.iter().position(|s| s.id == id) {
                return Some(category.subcategories.remove(pos));
            }
        }
        None
    }

    pub fn find_product(&self, category_id: &str, item_id: &str) -> Option<&Product> {
        self.find_category(category_id)
            .and_then(|c| c.find_product(item_id))
    }

    pub fn stats(&self) -> MenuStats {
        let mut stats = MenuStats::default();
        for category in self.all_categories() {
            stats.total_categories += 1;
            stats.total_products += category.items.len();
            stats.available_products += category.items.iter().filter(|p| p.available).count();
        }
        stats
    }

    /// Recompute `metadata` after a write
    pub fn refresh_metadata(&mut self, now: DateTime<Utc>) {
        let stats = self.stats();
        let version = self.metadata.as_ref().and_then(|m| m.version.clone());
        self.metadata = Some(MenuMetadata {
            last_updated: now,
            total_products: stats.total_products,
            total_categories: stats.total_categories,
            version,
        });
    }

    /// SHA-256 hex digest of the serialized document.
    ///
    /// Unknown fields live in `serde_json::Map` (a sorted map), so equal
    /// documents always serialize identically.
    pub fn content_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}
