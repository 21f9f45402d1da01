//! Category tree service.

use sqlx::PgPool;
use tracing::info;

use priceworth_core::CategoryId;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::category::{Category, CategoryDetail, CategoryInput, CategoryNode, CategoryTree};
use crate::services::ProductService;

/// Category service.
pub struct CategoryService<'a> {
    categories: CategoryRepository<'a>,
    products: ProductService<'a>,
}

impl<'a> CategoryService<'a> {
    /// Create a new category service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            products: ProductService::new(pool),
        }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the parent does not exist.
    /// Returns `AppError::BadRequest` if the name is already used.
    pub async fn create(&self, input: CategoryInput) -> Result<Category> {
        if let Some(parent) = input.parent_category_id {
            self.require_parent(parent).await?;
        }
        if self.categories.name_taken(&input.name, None).await? {
            return Err(duplicate_name(&input.name));
        }

        let category = self
            .categories
            .create(&input)
            .await
            .map_err(|e| write_error(e, &input))?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Top-level categories with their descendants nested under `children`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CategoryNode>> {
        let categories = self.categories.list().await?;
        Ok(CategoryTree::build(categories).into_nested())
    }

    /// Every category that has a parent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_subcategories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.list_subcategories().await?)
    }

    /// A category with its parent, direct children and products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<CategoryDetail> {
        let tree = CategoryTree::build(self.categories.list().await?);
        let category = tree.get(id).cloned().ok_or_else(|| not_found(id))?;
        let parent = category
            .parent_category_id
            .and_then(|parent_id| tree.get(parent_id))
            .cloned();
        let children = tree.children_of(id).cloned().collect();
        let products = self.products.list_in_category(id).await?;

        Ok(CategoryDetail {
            category,
            parent,
            children,
            products,
        })
    }

    /// Replace the editable fields of a category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the category would become its own
    /// parent or ancestor, or the name is already used.
    /// Returns `AppError::NotFound` if the category or the parent does not exist.
    pub async fn update(&self, id: CategoryId, input: CategoryInput) -> Result<Category> {
        if input.parent_category_id == Some(id) {
            return Err(AppError::BadRequest(format!(
                "Category ID cannot be equal to its parent category ID, id {id}"
            )));
        }
        if self.categories.get(id).await?.is_none() {
            return Err(not_found(id));
        }

        if let Some(parent) = input.parent_category_id {
            self.require_parent(parent).await?;
            let tree = CategoryTree::build(self.categories.list().await?);
            if tree.would_create_cycle(id, parent) {
                return Err(AppError::BadRequest(format!(
                    "Category #{parent} is a descendant of category #{id}"
                )));
            }
        }

        if self.categories.name_taken(&input.name, Some(id)).await? {
            return Err(duplicate_name(&input.name));
        }

        let category = self
            .categories
            .update(id, &input)
            .await
            .map_err(|e| write_error(e, &input))?
            .ok_or_else(|| not_found(id))?;

        info!(category_id = %id, "Category updated");
        Ok(category)
    }

    /// Delete a category. Its subcategories become top-level.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category does not exist.
    /// Returns `AppError::BadRequest` if products still belong to it.
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        let deleted = self.categories.delete(id).await.map_err(|e| match e {
            RepositoryError::ForeignKey(_) => AppError::BadRequest(format!(
                "Category with ID {id} still has products and cannot be deleted"
            )),
            other => other.into(),
        })?;

        if !deleted {
            return Err(not_found(id));
        }
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    async fn require_parent(&self, parent: CategoryId) -> Result<()> {
        if self.categories.get(parent).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Parent category with ID {parent} not found"
            )));
        }
        Ok(())
    }
}

fn not_found(id: CategoryId) -> AppError {
    AppError::NotFound(format!("Category with ID {id} not found"))
}

fn duplicate_name(name: &str) -> AppError {
    AppError::BadRequest(format!("Category name \"{name}\" already exists"))
}

/// Races between the pre-checks and the write surface as constraint errors.
fn write_error(e: RepositoryError, input: &CategoryInput) -> AppError {
    match e {
        RepositoryError::Conflict(_) => duplicate_name(&input.name),
        RepositoryError::ForeignKey(_) => AppError::NotFound(format!(
            "Parent category with ID {} not found",
            input.parent_category_id.map_or_else(String::new, |p| p.to_string())
        )),
        other => other.into(),
    }
}
