//! Category domain types and the in-memory category tree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use priceworth_core::CategoryId;

use super::product::ProductDetail;

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub show_on_homepage: bool,
    pub include_in_top_menu: bool,
    pub published: bool,
    pub parent_category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable category fields, used for both create and full update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub show_on_homepage: bool,
    #[serde(default)]
    pub include_in_top_menu: bool,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub parent_category_id: Option<CategoryId>,
}

const fn default_published() -> bool {
    true
}

/// A category with its nested subcategories, as returned by the tree listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// A single category with its neighbourhood and products.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<Category>,
    pub children: Vec<Category>,
    pub products: Vec<ProductDetail>,
}

/// Arena of categories with integer parent links and a derived children index.
///
/// Categories whose parent is not present in the arena are treated as roots.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<Category>,
    index: HashMap<CategoryId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl CategoryTree {
    /// Build the tree from a flat list. Sibling order follows input order.
    #[must_use]
    pub fn build(categories: Vec<Category>) -> Self {
        let index: HashMap<CategoryId, usize> = categories
            .iter()
            .enumerate()
            .map(|(slot, category)| (category.id, slot))
            .collect();

        let mut children = vec![Vec::new(); categories.len()];
        let mut roots = Vec::new();
        for (slot, category) in categories.iter().enumerate() {
            let parent_slot = category
                .parent_category_id
                .and_then(|parent| index.get(&parent).copied())
                .filter(|&parent_slot| parent_slot != slot);
            match parent_slot.and_then(|p| children.get_mut(p)) {
                Some(siblings) => siblings.push(slot),
                None => roots.push(slot),
            }
        }

        Self {
            nodes: categories,
            index,
            children,
            roots,
        }
    }

    /// Look up a category by id.
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.index.get(&id).and_then(|&slot| self.nodes.get(slot))
    }

    /// Direct children of `id` (empty when `id` is unknown).
    pub fn children_of(&self, id: CategoryId) -> impl Iterator<Item = &Category> {
        self.index
            .get(&id)
            .and_then(|&slot| self.children.get(slot))
            .into_iter()
            .flatten()
            .filter_map(|&child| self.nodes.get(child))
    }

    /// Whether making `new_parent` the parent of `id` would close a loop.
    ///
    /// Walks up from `new_parent`; reaching `id` means `id` would become its
    /// own ancestor. The walk is bounded by the arena size so corrupt data
    /// with an existing loop cannot spin forever.
    #[must_use]
    pub fn would_create_cycle(&self, id: CategoryId, new_parent: CategoryId) -> bool {
        let mut current = Some(new_parent);
        for _ in 0..=self.nodes.len() {
            match current {
                None => return false,
                Some(ancestor) if ancestor == id => return true,
                Some(ancestor) => {
                    current = self.get(ancestor).and_then(|c| c.parent_category_id);
                }
            }
        }
        true
    }

    /// Consume the arena and produce the nested listing.
    #[must_use]
    pub fn into_nested(self) -> Vec<CategoryNode> {
        let Self {
            nodes,
            children,
            roots,
            ..
        } = self;
        let mut slots: Vec<Option<Category>> = nodes.into_iter().map(Some).collect();
        roots
            .into_iter()
            .filter_map(|root| nest(root, &children, &mut slots))
            .collect()
    }
}

fn nest(
    slot: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<Category>],
) -> Option<CategoryNode> {
    let category = slots.get_mut(slot)?.take()?;
    let kids = children
        .get(slot)
        .map(|kids| {
            kids.iter()
                .filter_map(|&child| nest(child, children, slots))
                .collect()
        })
        .unwrap_or_default();
    Some(CategoryNode {
        category,
        children: kids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, parent: Option<i32>) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(id),
            name: format!("category-{id}"),
            description: String::new(),
            image: String::new(),
            show_on_homepage: false,
            include_in_top_menu: false,
            published: true,
            parent_category_id: parent.map(CategoryId::new),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_tree() -> CategoryTree {
        // 1 -> 2 -> 4, 1 -> 3, 5
        CategoryTree::build(vec![
            category(1, None),
            category(2, Some(1)),
            category(3, Some(1)),
            category(4, Some(2)),
            category(5, None),
        ])
    }

    #[test]
    fn test_roots_and_children_keep_input_order() {
        let nested = sample_tree().into_nested();
        let roots: Vec<i32> = nested.iter().map(|n| n.category.id.as_i32()).collect();
        assert_eq!(roots, vec![1, 5]);

        let children: Vec<i32> = nested
            .first()
            .unwrap()
            .children
            .iter()
            .map(|n| n.category.id.as_i32())
            .collect();
        assert_eq!(children, vec![2, 3]);
        assert!(nested.get(1).unwrap().children.is_empty());
    }

    #[test]
    fn test_get_and_children_of() {
        let tree = sample_tree();
        assert_eq!(tree.get(CategoryId::new(4)).unwrap().name, "category-4");
        assert!(tree.get(CategoryId::new(99)).is_none());

        let children: Vec<i32> = tree
            .children_of(CategoryId::new(1))
            .map(|c| c.id.as_i32())
            .collect();
        assert_eq!(children, vec![2, 3]);
        assert_eq!(tree.children_of(CategoryId::new(4)).count(), 0);
        assert_eq!(tree.children_of(CategoryId::new(99)).count(), 0);
    }

    #[test]
    fn test_self_parent_is_not_its_own_child() {
        let tree = CategoryTree::build(vec![category(6, Some(6))]);
        assert_eq!(tree.children_of(CategoryId::new(6)).count(), 0);
        assert_eq!(tree.into_nested().len(), 1);
    }

    #[test]
    fn test_missing_parent_becomes_root() {
        let nested = CategoryTree::build(vec![category(7, Some(42))]).into_nested();
        assert_eq!(nested.len(), 1);
    }

    #[test]
    fn test_unknown_ancestor_ends_cycle_walk() {
        let tree = CategoryTree::build(vec![category(7, Some(42))]);
        assert!(!tree.would_create_cycle(CategoryId::new(8), CategoryId::new(7)));
    }

    #[test]
    fn test_into_nested() {
        let nested = sample_tree().into_nested();
        assert_eq!(nested.len(), 2);
        let first = nested.first().unwrap();
        assert_eq!(first.category.id, CategoryId::new(1));
        assert_eq!(first.children.len(), 2);
        let grandchild = first.children.first().unwrap().children.first().unwrap();
        assert_eq!(grandchild.category.id, CategoryId::new(4));
    }

    #[test]
    fn test_would_create_cycle() {
        let tree = sample_tree();
        // 1 under its grandchild 4 would loop
        assert!(tree.would_create_cycle(CategoryId::new(1), CategoryId::new(4)));
        assert!(tree.would_create_cycle(CategoryId::new(2), CategoryId::new(2)));
        // 4 under 3 is fine
        assert!(!tree.would_create_cycle(CategoryId::new(4), CategoryId::new(3)));
        assert!(!tree.would_create_cycle(CategoryId::new(5), CategoryId::new(1)));
    }

    #[test]
    fn test_nested_serializes_flat_fields() {
        let nested = sample_tree().into_nested();
        let json = serde_json::to_value(&nested).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["parentCategoryId"], serde_json::Value::Null);
        assert_eq!(json[0]["children"][0]["name"], "category-2");
    }
}
