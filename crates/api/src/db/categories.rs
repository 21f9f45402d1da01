//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use priceworth_core::CategoryId;

use super::{RepositoryError, map_constraint_error};
use crate::models::category::{Category, CategoryInput};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: String,
    image: String,
    show_on_homepage: bool,
    include_in_top_menu: bool,
    published: bool,
    parent_category_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            image: row.image,
            show_on_homepage: row.show_on_homepage,
            include_in_top_menu: row.include_in_top_menu,
            published: row.published,
            parent_category_id: row.parent_category_id.map(CategoryId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, show_on_homepage, include_in_top_menu,
                   published, parent_category_id, created_at, updated_at
            FROM shop.category
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Every category that has a parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_subcategories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, show_on_homepage, include_in_top_menu,
                   published, parent_category_id, created_at, updated_at
            FROM shop.category
            WHERE parent_category_id IS NOT NULL
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, show_on_homepage, include_in_top_menu,
                   published, parent_category_id, created_at, updated_at
            FROM shop.category
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Whether another category already uses `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_taken(
        &self,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM shop.category
                WHERE name = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            ",
        )
        .bind(name)
        .bind(except)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    /// Returns `RepositoryError::ForeignKey` if the parent does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category
                (name, description, image, show_on_homepage, include_in_top_menu,
                 published, parent_category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, image, show_on_homepage, include_in_top_menu,
                      published, parent_category_id, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.show_on_homepage)
        .bind(input.include_in_top_menu)
        .bind(input.published)
        .bind(input.parent_category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "category name"))?;

        Ok(row.into())
    }

    /// Replace every editable field of a category.
    ///
    /// Returns `None` if the category does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    /// Returns `RepositoryError::ForeignKey` if the parent does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.category
            SET name = $2, description = $3, image = $4, show_on_homepage = $5,
                include_in_top_menu = $6, published = $7, parent_category_id = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, image, show_on_homepage, include_in_top_menu,
                      published, parent_category_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.show_on_homepage)
        .bind(input.include_in_top_menu)
        .bind(input.published)
        .bind(input.parent_category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "category name"))?;

        Ok(row.map(Category::from))
    }

    /// Delete a category. Subcategories are detached by the schema.
    ///
    /// Returns `false` if the category did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if products still reference it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "category"))?;

        Ok(result.rows_affected() > 0)
    }
}
