//! Built-in model catalog
//!
//! Loads the static model descriptors embedded in builtin_catalog.toml and
//! exposes lookup, search, and category filtering for the picker and the
//! `-m` listing.

use std::sync::LazyLock;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub category: String,
    pub provider: String,
    pub free: bool,
    pub context_limit: u32,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<ModelDescriptor>,
}

static CATALOG: LazyLock<Vec<ModelDescriptor>> = LazyLock::new(|| {
    const CATALOG_CONTENT: &str = include_str!("../builtin_catalog.toml");

    let catalog: CatalogFile =
        toml::from_str(CATALOG_CONTENT).expect("Failed to parse builtin_catalog.toml");
    catalog.models
});

impl ModelDescriptor {
    /// Context window shown in pickers and listings, e.g. "128K".
    pub fn context_label(&self) -> String {
        format!("{}K", self.context_limit / 1000)
    }

    /// Case-insensitive substring match over display name and provider label.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.provider.to_lowercase().contains(&needle)
    }

    /// Category filter; the `free` category also admits any free-tier model.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
            || (category.eq_ignore_ascii_case("free") && self.free)
    }
}

/// All catalog entries, in file order.
pub fn all_models() -> &'static [ModelDescriptor] {
    &CATALOG
}

/// Find a catalog entry by id (case-insensitive).
pub fn find_model(id: &str) -> Option<&'static ModelDescriptor> {
    all_models().iter().find(|m| m.id.eq_ignore_ascii_case(id))
}

/// Distinct category tags in first-appearance order.
pub fn categories() -> Vec<&'static str> {
    let mut seen = Vec::new();
    for model in all_models() {
        if !seen.contains(&model.category.as_str()) {
            seen.push(model.category.as_str());
        }
    }
    seen
}

/// Entries matching both the search needle and the category, catalog order
/// preserved. `None` for category means all categories.
pub fn filter_models(search: &str, category: Option<&str>) -> Vec<&'static ModelDescriptor> {
    all_models()
        .iter()
        .filter(|m| m.matches_search(search))
        .filter(|m| category.is_none_or(|c| m.in_category(c)))
        .collect()
}
