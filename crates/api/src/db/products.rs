//! Product, variant and feature repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use priceworth_core::{
    CategoryId, FeatureId, ProductId, ShoppingCartId, VariantId, round_money,
};

use super::carts::refresh_totals;
use super::{RepositoryError, map_constraint_error};
use crate::models::product::{
    Feature, FeatureFields, FeatureUpdate, NewProduct, Product, ProductUpdate, ProductVariant,
    VariantFields, VariantUpdate,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    model: String,
    product_category_id: i32,
    short_description: String,
    long_description: String,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            model: row.model,
            product_category_id: CategoryId::new(row.product_category_id),
            short_description: row.short_description,
            long_description: row.long_description,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    name: String,
    sku: String,
    color: String,
    dimension_height: f64,
    dimension_length: f64,
    dimension_width: f64,
    weight: f64,
    price: Decimal,
    total_inventory: i32,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            sku: row.sku,
            color: row.color,
            dimension_height: row.dimension_height,
            dimension_length: row.dimension_length,
            dimension_width: row.dimension_width,
            weight: row.weight,
            price: round_money(row.price),
            total_inventory: row.total_inventory,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeatureRow {
    id: i32,
    product_id: i32,
    key: String,
    value: String,
}

impl From<FeatureRow> for Feature {
    fn from(row: FeatureRow) -> Self {
        Self {
            id: FeatureId::new(row.id),
            product_id: ProductId::new(row.product_id),
            key: row.key,
            value: row.value,
        }
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, model, product_category_id, short_description,
                   long_description, published, created_at, updated_at
            FROM shop.product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Products assigned to a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, model, product_category_id, short_description,
                   long_description, published, created_at, updated_at
            FROM shop.product
            WHERE product_category_id = $1
            ORDER BY id
            ",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, model, product_category_id, short_description,
                   long_description, published, created_at, updated_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a product with its variants and features in one transaction.
    ///
    /// Variant prices must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a variant SKU already exists.
    /// Returns `RepositoryError::ForeignKey` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &NewProduct) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shop.product
                (name, model, product_category_id, short_description, long_description, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.model)
        .bind(input.product_category_id)
        .bind(&input.short_description)
        .bind(&input.long_description)
        .bind(input.published)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "product"))?;
        let product_id = ProductId::new(id);

        for variant in &input.product_variants {
            insert_variant(&mut tx, product_id, variant).await?;
        }

        for feature in &input.features {
            sqlx::query("INSERT INTO shop.feature (product_id, key, value) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(&feature.key)
                .bind(&feature.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            product_id = %product_id,
            variants = input.product_variants.len(),
            features = input.features.len(),
            "Inserted product"
        );
        Ok(product_id)
    }

    /// Apply a partial update. Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the new category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.product
            SET name = COALESCE($2, name),
                model = COALESCE($3, model),
                product_category_id = COALESCE($4, product_category_id),
                short_description = COALESCE($5, short_description),
                long_description = COALESCE($6, long_description),
                published = COALESCE($7, published),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, model, product_category_id, short_description,
                      long_description, published, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.model.as_deref())
        .bind(update.product_category_id)
        .bind(update.short_description.as_deref())
        .bind(update.long_description.as_deref())
        .bind(update.published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "product"))?;

        Ok(row.map(Product::from))
    }

    /// Delete a product with its variants and features, then reprice every
    /// cart that held one of its variants.
    ///
    /// Returns `false` if the product did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if an order references one of its variants.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let carts: Vec<(ShoppingCartId,)> = sqlx::query_as(
            r"
            SELECT DISTINCT i.shopping_cart_id
            FROM shop.shopping_cart_item i
            JOIN shop.product_variant v ON v.id = i.product_variant_id
            WHERE v.product_id = $1
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint_error(e, "product"))?;

        let cart_ids: Vec<ShoppingCartId> = carts.into_iter().map(|(cart,)| cart).collect();
        refresh_totals(&mut tx, &cart_ids).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Variants of the given products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, name, sku, color, dimension_height, dimension_length,
                   dimension_width, weight, price, total_inventory, images,
                   created_at, updated_at
            FROM shop.product_variant
            WHERE product_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }

    /// Get a variant by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variant(
        &self,
        id: VariantId,
    ) -> Result<Option<ProductVariant>, RepositoryError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, name, sku, color, dimension_height, dimension_length,
                   dimension_width, weight, price, total_inventory, images,
                   created_at, updated_at
            FROM shop.product_variant
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductVariant::from))
    }

    /// Which of `ids` exist as variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_variant_ids(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<VariantId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
        let rows: Vec<(VariantId,)> =
            sqlx::query_as("SELECT id FROM shop.product_variant WHERE id = ANY($1)")
                .bind(&raw)
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Insert a single variant. The price must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    /// Returns `RepositoryError::ForeignKey` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_variant(
        &self,
        product_id: ProductId,
        fields: &VariantFields,
    ) -> Result<ProductVariant, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let variant = insert_variant(&mut tx, product_id, fields).await?;
        tx.commit().await?;
        Ok(variant)
    }

    /// Apply a partial update. Returns `None` if the variant does not exist.
    ///
    /// Existing cart lines keep the subtotal computed when they were last
    /// added or updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new SKU already exists.
    /// Returns `RepositoryError::ForeignKey` if the new product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_variant(
        &self,
        id: VariantId,
        update: &VariantUpdate,
    ) -> Result<Option<ProductVariant>, RepositoryError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r"
            UPDATE shop.product_variant
            SET product_id = COALESCE($2, product_id),
                name = COALESCE($3, name),
                sku = COALESCE($4, sku),
                color = COALESCE($5, color),
                dimension_height = COALESCE($6, dimension_height),
                dimension_length = COALESCE($7, dimension_length),
                dimension_width = COALESCE($8, dimension_width),
                weight = COALESCE($9, weight),
                price = COALESCE($10, price),
                total_inventory = COALESCE($11, total_inventory),
                images = COALESCE($12, images),
                updated_at = now()
            WHERE id = $1
            RETURNING id, product_id, name, sku, color, dimension_height, dimension_length,
                      dimension_width, weight, price, total_inventory, images,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.product_id)
        .bind(update.name.as_deref())
        .bind(update.sku.as_deref())
        .bind(update.color.as_deref())
        .bind(update.dimension_height)
        .bind(update.dimension_length)
        .bind(update.dimension_width)
        .bind(update.weight)
        .bind(update.price)
        .bind(update.total_inventory)
        .bind(update.images.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "sku"))?;

        Ok(row.map(ProductVariant::from))
    }

    /// Delete a variant, drop it from every cart and reprice those carts.
    ///
    /// Returns `false` if the variant did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if an order references the variant.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete_variant(&self, id: VariantId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let carts: Vec<(ShoppingCartId,)> = sqlx::query_as(
            r"
            SELECT DISTINCT shopping_cart_id
            FROM shop.shopping_cart_item
            WHERE product_variant_id = $1
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM shop.product_variant WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint_error(e, "variant"))?;

        let cart_ids: Vec<ShoppingCartId> = carts.into_iter().map(|(cart,)| cart).collect();
        refresh_totals(&mut tx, &cart_ids).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Features
    // =========================================================================

    /// Features of the given products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn features_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Feature>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, FeatureRow>(
            r"
            SELECT id, product_id, key, value
            FROM shop.feature
            WHERE product_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Feature::from).collect())
    }

    /// Insert a feature.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_feature(
        &self,
        product_id: ProductId,
        fields: &FeatureFields,
    ) -> Result<Feature, RepositoryError> {
        let row = sqlx::query_as::<_, FeatureRow>(
            r"
            INSERT INTO shop.feature (product_id, key, value)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, key, value
            ",
        )
        .bind(product_id)
        .bind(&fields.key)
        .bind(&fields.value)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "feature"))?;

        Ok(row.into())
    }

    /// Apply a partial update. Returns `None` if the feature does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the new product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_feature(
        &self,
        id: FeatureId,
        update: &FeatureUpdate,
    ) -> Result<Option<Feature>, RepositoryError> {
        let row = sqlx::query_as::<_, FeatureRow>(
            r"
            UPDATE shop.feature
            SET product_id = COALESCE($2, product_id),
                key = COALESCE($3, key),
                value = COALESCE($4, value)
            WHERE id = $1
            RETURNING id, product_id, key, value
            ",
        )
        .bind(id)
        .bind(update.product_id)
        .bind(update.key.as_deref())
        .bind(update.value.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "feature"))?;

        Ok(row.map(Feature::from))
    }

    /// Delete a feature. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_feature(&self, id: FeatureId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.feature WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_variant(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    fields: &VariantFields,
) -> Result<ProductVariant, RepositoryError> {
    let row = sqlx::query_as::<_, VariantRow>(
        r"
        INSERT INTO shop.product_variant
            (product_id, name, sku, color, dimension_height, dimension_length,
             dimension_width, weight, price, total_inventory, images)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id, product_id, name, sku, color, dimension_height, dimension_length,
                  dimension_width, weight, price, total_inventory, images,
                  created_at, updated_at
        ",
    )
    .bind(product_id)
    .bind(&fields.name)
    .bind(&fields.sku)
    .bind(&fields.color)
    .bind(fields.dimension_height)
    .bind(fields.dimension_length)
    .bind(fields.dimension_width)
    .bind(fields.weight)
    .bind(fields.price)
    .bind(fields.total_inventory)
    .bind(&fields.images)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_constraint_error(e, "sku"))?;

    Ok(row.into())
}
