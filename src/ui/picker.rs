//! Model picker state: a filterable list over the built-in catalog.
//!
//! Typing narrows by search, Tab cycles through category filters, and the
//! selection survives refiltering when its model is still visible.

use crate::core::catalog::{self, ModelDescriptor};

#[derive(Debug, Clone)]
pub struct PickerItem {
    pub id: String,
    pub label: String,
}

impl PickerItem {
    fn from_descriptor(model: &ModelDescriptor) -> Self {
        let free_tag = if model.free { " [free]" } else { "" };
        Self {
            id: model.id.clone(),
            label: format!(
                "{} — {} ({}){}",
                model.name,
                model.provider,
                model.context_label(),
                free_tag
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickerState {
    pub items: Vec<PickerItem>,
    pub selected: usize,
    search: String,
    category_index: usize,
}

impl PickerState {
    /// Build a picker over the whole catalog, positioned on `current` when
    /// that model is in it.
    pub fn for_models(current: &str) -> Self {
        let mut picker = Self {
            items: Vec::new(),
            selected: 0,
            search: String::new(),
            category_index: 0,
        };
        picker.refresh(Some(current));
        picker
    }

    /// "all" plus each distinct catalog category.
    fn category_labels() -> Vec<&'static str> {
        let mut labels = vec!["all"];
        labels.extend(catalog::categories());
        labels
    }

    pub fn category(&self) -> &'static str {
        let labels = Self::category_labels();
        labels[self.category_index % labels.len()]
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Title for the picker frame, reflecting the active filters.
    pub fn title(&self) -> String {
        let mut title = format!("Pick a model ({})", self.category());
        if !self.search.is_empty() {
            title.push_str(&format!(" /{}", self.search));
        }
        title
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.items.get(self.selected).map(|i| i.id.as_str())
    }

    pub fn move_up(&mut self) {
        if !self.items.is_empty() {
            if self.selected == 0 {
                self.selected = self.items.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn move_down(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.refresh(None);
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.refresh(None);
    }

    pub fn cycle_category(&mut self) {
        self.category_index = (self.category_index + 1) % Self::category_labels().len();
        self.refresh(None);
    }

    /// Refilter the item list. The previous selection is kept when its model
    /// survives the filter; `prefer` (the active model) wins on a rebuild.
    fn refresh(&mut self, prefer: Option<&str>) {
        let keep = prefer
            .map(str::to_string)
            .or_else(|| self.selected_id().map(str::to_string));

        let category = match self.category() {
            "all" => None,
            other => Some(other),
        };
        self.items = catalog::filter_models(&self.search, category)
            .into_iter()
            .map(PickerItem::from_descriptor)
            .collect();

        self.selected = keep
            .and_then(|id| self.items.iter().position(|item| item.id == id))
            .unwrap_or(0);
    }
}
