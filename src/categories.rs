use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_CATEGORIES, DEFAULT_ICON},
    domain::{Category, CategoryId, Direction, swap_with_neighbor},
    error::CategoryError,
};

/// User-defined categories; their order drives rendering and export order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryStore {
    categories: Vec<Category>,
}

impl Default for CategoryStore {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|c| Category {
                    id: CategoryId::new(c.id),
                    label: c.label.to_string(),
                    icon: c.icon.to_string(),
                })
                .collect(),
        }
    }
}

impl CategoryStore {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn as_slice(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id.as_str() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id.as_str() == id)
    }

    /// Resolves a category by id or by its (case-insensitive) label.
    pub fn find(&self, key: &str) -> Option<&Category> {
        self.get(key).or_else(|| {
            self.categories
                .iter()
                .find(|c| c.label.eq_ignore_ascii_case(key.trim()))
        })
    }

    pub fn add(&mut self, name: &str) -> Result<&Category, CategoryError> {
        let label = name.trim();
        let id = CategoryId::from_name(label);
        if label.is_empty() || id.as_str().is_empty() {
            return Err(CategoryError::EmptyName);
        }
        if self.get(id.as_str()).is_some() {
            return Err(CategoryError::DuplicateId(id));
        }

        self.categories.push(Category {
            id,
            label: label.to_string(),
            icon: DEFAULT_ICON.to_string(),
        });
        let index = self.categories.len() - 1;
        Ok(&self.categories[index])
    }

    pub fn remove(&mut self, id: &str) -> Option<Category> {
        let index = self.position(id)?;
        Some(self.categories.remove(index))
    }

    pub fn reorder(&mut self, index: usize, direction: Direction) -> bool {
        swap_with_neighbor(&mut self.categories, index, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(store: &CategoryStore) -> Vec<&str> {
        store.as_slice().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_defaults_are_seeded() {
        let store = CategoryStore::default();
        assert_eq!(
            ids(&store),
            vec![
                "meta",
                "sustentacao",
                "gestao",
                "listbuilding",
                "onboarding",
                "outros"
            ]
        );
        assert_eq!(store.get("meta").unwrap().label, "Integração Meta");
    }

    #[test]
    fn test_add_appends_with_slug_id_and_default_icon() {
        let mut store = CategoryStore::new(Vec::new());
        let added = store.add("  Code Review  ").unwrap().clone();

        assert_eq!(added.id, CategoryId::new("code_review"));
        assert_eq!(added.label, "Code Review");
        assert_eq!(added.icon, DEFAULT_ICON);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_empty_and_duplicates() {
        let mut store = CategoryStore::new(Vec::new());
        assert_eq!(store.add("   ").unwrap_err(), CategoryError::EmptyName);
        assert_eq!(store.add("!!!").unwrap_err(), CategoryError::EmptyName);

        store.add("Outros").unwrap();
        assert_eq!(
            store.add("outros").unwrap_err(),
            CategoryError::DuplicateId(CategoryId::new("outros"))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_and_reorder() {
        let mut store = CategoryStore::default();
        assert!(store.reorder(0, Direction::Down));
        assert_eq!(ids(&store)[..2], ["sustentacao", "meta"]);
        assert!(!store.reorder(0, Direction::Up));
        assert!(!store.reorder(5, Direction::Down));

        let removed = store.remove("meta").unwrap();
        assert_eq!(removed.id, CategoryId::new("meta"));
        assert!(store.remove("meta").is_none());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_find_by_label() {
        let store = CategoryStore::default();
        assert_eq!(store.find("outros").unwrap().label, "Outros");
        assert_eq!(store.find("listbuilding").unwrap().id.as_str(), "listbuilding");
        assert_eq!(store.find("Max Onboarding").unwrap().id.as_str(), "onboarding");
        assert!(store.find("nope").is_none());
    }
}
